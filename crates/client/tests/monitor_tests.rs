//! Tests for the gas monitor, driven through a mock upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feegate_client::{GasMonitor, Result as ClientResult, UpstreamError, UpstreamRpc};
use feegate_store::TxStore;
use feegate_types::{Address, SignedTransaction, Transaction, TxStatus};
use k256::ecdsa::SigningKey;
use tokio_util::sync::CancellationToken;

enum SendBehavior {
    Accept,
    RejectRpc(&'static str),
    FailTransport,
}

struct MockUpstream {
    gas_price: Option<u128>,
    send: SendBehavior,
    sends: AtomicUsize,
}

impl MockUpstream {
    fn new(gas_price: Option<u128>, send: SendBehavior) -> Arc<Self> {
        Arc::new(Self {
            gas_price,
            send,
            sends: AtomicUsize::new(0),
        })
    }

    fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamRpc for MockUpstream {
    async fn gas_price(&self) -> ClientResult<u128> {
        self.gas_price
            .ok_or(UpstreamError::Http(reqwest::StatusCode::BAD_GATEWAY))
    }

    async fn send_raw_transaction(&self, _raw_hex: &str) -> ClientResult<()> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        match self.send {
            SendBehavior::Accept => Ok(()),
            SendBehavior::RejectRpc(message) => Err(UpstreamError::Rpc {
                code: -32000,
                message: message.to_string(),
            }),
            SendBehavior::FailTransport => {
                Err(UpstreamError::Http(reqwest::StatusCode::BAD_GATEWAY))
            }
        }
    }
}

/// Ingests a transaction whose summed fee caps equal `max_fee + tip`.
fn ingest_with_caps(store: &TxStore, nonce: u64, max_fee: u128, tip: u128) -> feegate_types::H256 {
    let key = SigningKey::from_bytes((&[7u8; 32]).into()).unwrap();
    let to = {
        let other = SigningKey::from_bytes((&[9u8; 32]).into()).unwrap();
        let point = other.verifying_key().to_encoded_point(false);
        Address::from_public_key(&point.as_bytes()[1..])
    };
    let signed: SignedTransaction = Transaction::transfer(1, nonce, to, 100)
        .with_fees(max_fee, tip)
        .sign(&key)
        .unwrap();
    let raw_hex = format!("0x{}", hex::encode(signed.encode()));
    let hash = signed.hash();
    store.ingest(signed, raw_hex).unwrap();
    hash
}

fn spawn_monitor(
    upstream: Arc<MockUpstream>,
    store: Arc<TxStore>,
) -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let monitor = GasMonitor::new(upstream, store, Duration::from_millis(50));
    let handle = tokio::spawn(monitor.run(cancel.clone()));
    (cancel, handle)
}

#[tokio::test(start_paused = true)]
async fn broadcasts_when_caps_clear_the_gas_price() {
    let store = Arc::new(TxStore::new());
    let hash = ingest_with_caps(&store, 0, 1, 1);

    let upstream = MockUpstream::new(Some(1), SendBehavior::Accept);
    let (cancel, handle) = spawn_monitor(upstream.clone(), store.clone());

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(store.status(&hash), Some(TxStatus::Broadcasted));
    assert_eq!(upstream.send_count(), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn holds_when_caps_are_below_the_gas_price() {
    let store = Arc::new(TxStore::new());
    let hash = ingest_with_caps(&store, 0, 0, 0);

    let upstream = MockUpstream::new(Some(1), SendBehavior::Accept);
    let (cancel, handle) = spawn_monitor(upstream.clone(), store.clone());

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(store.status(&hash), Some(TxStatus::Stored));
    assert_eq!(upstream.send_count(), 0);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn caps_equal_to_the_gas_price_are_broadcast() {
    let store = Arc::new(TxStore::new());
    let hash = ingest_with_caps(&store, 0, 1, 1);

    let upstream = MockUpstream::new(Some(2), SendBehavior::Accept);
    let (cancel, handle) = spawn_monitor(upstream.clone(), store.clone());

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(store.status(&hash), Some(TxStatus::Broadcasted));

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rpc_rejection_marks_the_transaction_failed() {
    let store = Arc::new(TxStore::new());
    let hash = ingest_with_caps(&store, 0, 1, 1);

    let upstream = MockUpstream::new(Some(1), SendBehavior::RejectRpc("nonce too low"));
    let (cancel, handle) = spawn_monitor(upstream.clone(), store.clone());

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(store.status(&hash), Some(TxStatus::Failed));

    // FAILED records are never retried.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(upstream.send_count(), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn transport_failure_leaves_the_transaction_stored_for_retry() {
    let store = Arc::new(TxStore::new());
    let hash = ingest_with_caps(&store, 0, 1, 1);

    let upstream = MockUpstream::new(Some(1), SendBehavior::FailTransport);
    let (cancel, handle) = spawn_monitor(upstream.clone(), store.clone());

    tokio::time::sleep(Duration::from_millis(160)).await;

    assert_eq!(store.status(&hash), Some(TxStatus::Stored));
    assert!(upstream.send_count() >= 2, "expected retries on later ticks");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn gas_price_failure_skips_the_tick() {
    let store = Arc::new(TxStore::new());
    let hash = ingest_with_caps(&store, 0, 1, 1);

    let upstream = MockUpstream::new(None, SendBehavior::Accept);
    let (cancel, handle) = spawn_monitor(upstream.clone(), store.clone());

    tokio::time::sleep(Duration::from_millis(160)).await;

    assert_eq!(store.status(&hash), Some(TxStatus::Stored));
    assert_eq!(upstream.send_count(), 0);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_monitor() {
    let store = Arc::new(TxStore::new());
    let upstream = MockUpstream::new(Some(1), SendBehavior::Accept);
    let (cancel, handle) = spawn_monitor(upstream, store);

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();
    handle.await.unwrap();
}
