//! Gas price monitor.
//!
//! A background task that wakes on a fixed period, queries the upstream gas
//! price, and broadcasts every stored transaction whose fee caps clear it.
//! The store lock is held only while snapshotting candidates and while
//! writing back a status; never across network I/O.

use std::sync::Arc;
use std::time::Duration;

use feegate_store::TxStore;
use feegate_types::TxStatus;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::UpstreamRpc;

/// Default period between gas price checks.
pub const DEFAULT_MONITOR_PERIOD: Duration = Duration::from_secs(5);

/// Periodic task that drives stored transactions to broadcast.
pub struct GasMonitor<C> {
    client: Arc<C>,
    store: Arc<TxStore>,
    period: Duration,
}

impl<C: UpstreamRpc> GasMonitor<C> {
    /// Creates a monitor over the given upstream client and store.
    pub fn new(client: Arc<C>, store: Arc<TxStore>, period: Duration) -> Self {
        Self {
            client,
            store,
            period,
        }
    }

    /// Runs until the cancellation token fires.
    ///
    /// Cancellation is observed both between ticks and during upstream I/O;
    /// dropping the in-flight call aborts the HTTP request.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period_ms = self.period.as_millis() as u64, "gas monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.tick() => {}
            }
        }

        debug!("gas monitor stopped");
    }

    async fn tick(&self) {
        let gas_price = match self.client.gas_price().await {
            Ok(price) => price,
            Err(err) => {
                warn!(error = %err, "failed to fetch gas price");
                return;
            }
        };

        // Entries ingested after this snapshot are picked up next tick.
        let candidates = self.store.broadcast_candidates(gas_price);
        if candidates.is_empty() {
            debug!(gas_price, "no broadcastable transactions this tick");
            return;
        }

        for (hash, raw_hex) in candidates {
            match self.client.send_raw_transaction(&raw_hex).await {
                Ok(()) => {
                    info!(tx_hash = %hash, gas_price, "broadcasted transaction");
                    self.report(hash, TxStatus::Broadcasted);
                }
                Err(err) if err.is_rpc() => {
                    // The chain rejected the payload (nonce too low, already
                    // known, ...); retrying is futile.
                    warn!(tx_hash = %hash, error = %err, "upstream rejected transaction");
                    self.report(hash, TxStatus::Failed);
                }
                Err(err) => {
                    // Transient; the record stays STORED for the next tick.
                    warn!(tx_hash = %hash, error = %err, "broadcast failed, will retry");
                }
            }
        }
    }

    /// Writes a broadcast result back to the store. A failure here means a
    /// concurrent writer changed the status between snapshot and write-back;
    /// it is logged and otherwise ignored.
    fn report(&self, hash: feegate_types::H256, status: TxStatus) {
        if let Err(err) = self.store.change_status(&hash, status) {
            warn!(tx_hash = %hash, error = %err, "status changed concurrently, skipping update");
        }
    }
}
