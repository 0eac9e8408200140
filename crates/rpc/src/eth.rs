//! Handlers for the two locally-dispatched JSON-RPC methods.

use feegate_store::TxStore;
use feegate_types::{SignedTransaction, H256};
use serde_json::json;
use tracing::{error, info};

use crate::types::{JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, SERVER_ERROR};

/// Handles `eth_sendRawTransaction`.
///
/// The transaction is decoded and ingested rather than broadcast; the
/// response is its hash either way, so wallets cannot tell the proxy from a
/// node.
pub fn send_raw_transaction(store: &TxStore, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(param) = request.params.first() else {
        error!("eth_sendRawTransaction called without params");
        return JsonRpcResponse::error(
            request.id,
            INVALID_PARAMS,
            "invalid parameters: not enough params to decode",
        );
    };

    let Some(raw_hex) = param.as_str().filter(|s| is_raw_tx_hex(s)) else {
        error!("eth_sendRawTransaction called with malformed raw transaction hex");
        return JsonRpcResponse::error(request.id, INVALID_PARAMS, "invalid params");
    };

    let bytes = match hex::decode(&raw_hex[2..]) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(error = %err, "failed to decode transaction hex");
            return JsonRpcResponse::error(request.id, INVALID_PARAMS, "invalid params");
        }
    };

    let tx = match SignedTransaction::decode(&bytes) {
        Ok(tx) => tx,
        Err(err) => {
            error!(error = %err, "failed to decode signed transaction");
            return JsonRpcResponse::error(request.id, INVALID_PARAMS, "invalid params");
        }
    };

    let hash = tx.hash();
    match store.ingest(tx, raw_hex.to_string()) {
        Ok(outcome) => {
            info!(tx_hash = %hash, ?outcome, "accepted raw transaction");
            JsonRpcResponse::result(request.id, json!(hash.to_hex()))
        }
        Err(err) => {
            error!(tx_hash = %hash, error = %err, "rejected raw transaction");
            JsonRpcResponse::error(request.id, SERVER_ERROR, err.to_string())
        }
    }
}

/// Handles `cancel_transaction`.
pub fn cancel_transaction(store: &TxStore, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(param) = request.params.first() else {
        error!("cancel_transaction called without params");
        return JsonRpcResponse::error(
            request.id,
            INVALID_PARAMS,
            "invalid parameters: not enough params to decode",
        );
    };

    let hash = match param.as_str().filter(|s| is_tx_hash(s)).map(H256::from_hex) {
        Some(Ok(hash)) => hash,
        _ => {
            error!("cancel_transaction called with malformed hash");
            return JsonRpcResponse::error(request.id, INVALID_PARAMS, "invalid params");
        }
    };

    match store.cancel(&hash) {
        Ok(()) => JsonRpcResponse::result(request.id, json!("Transaction canceled")),
        Err(err) => {
            error!(tx_hash = %hash, error = %err, "failed to cancel transaction");
            JsonRpcResponse::error(request.id, SERVER_ERROR, err.to_string())
        }
    }
}

/// Matches `^0x[0-9a-fA-F]+$`.
fn is_raw_tx_hex(s: &str) -> bool {
    s.len() > 2 && s.starts_with("0x") && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Matches `^0x[0-9a-fA-F]{64}$`.
fn is_tx_hash(s: &str) -> bool {
    s.len() == 66 && s.starts_with("0x") && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feegate_types::{Address, Transaction};
    use k256::ecdsa::SigningKey;
    use serde_json::{json, Value};

    fn request(method: &str, params: Vec<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            method: method.to_string(),
            params,
            id: json!(1),
        }
    }

    fn signed_raw_hex() -> (H256, String) {
        let key = SigningKey::from_bytes((&[3u8; 32]).into()).unwrap();
        let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").unwrap();
        let signed = Transaction::transfer(1, 0, to, 500)
            .with_fees(6, 4)
            .sign(&key)
            .unwrap();
        let raw = format!("0x{}", hex::encode(signed.encode()));
        (signed.hash(), raw)
    }

    #[test]
    fn raw_tx_hex_validation() {
        assert!(is_raw_tx_hex("0x02f8"));
        assert!(is_raw_tx_hex("0xAbCd01"));
        assert!(!is_raw_tx_hex("0x"));
        assert!(!is_raw_tx_hex("02f8"));
        assert!(!is_raw_tx_hex("0xzz"));
    }

    #[test]
    fn tx_hash_validation() {
        let good = format!("0x{}", "ab".repeat(32));
        assert!(is_tx_hash(&good));
        assert!(!is_tx_hash(&format!("0x{}", "ab".repeat(31))));
        assert!(!is_tx_hash(&format!("0x{}", "ab".repeat(33))));
        assert!(!is_tx_hash(&format!("0x{}", "zz".repeat(32))));
        assert!(!is_tx_hash(&"ab".repeat(33)));
    }

    #[test]
    fn send_raw_transaction_returns_the_hash() {
        let store = TxStore::new();
        let (hash, raw) = signed_raw_hex();

        let response = send_raw_transaction(&store, request("eth_sendRawTransaction", vec![json!(raw)]));

        assert_eq!(response.result, Some(json!(hash.to_hex())));
        assert!(response.error.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn send_raw_transaction_duplicate_reports_status() {
        let store = TxStore::new();
        let (_, raw) = signed_raw_hex();

        send_raw_transaction(&store, request("eth_sendRawTransaction", vec![json!(raw)]));
        let response =
            send_raw_transaction(&store, request("eth_sendRawTransaction", vec![json!(raw)]));

        let error = response.error.unwrap();
        assert_eq!(error.code, SERVER_ERROR);
        assert_eq!(error.message, "already STORED");
    }

    #[test]
    fn send_raw_transaction_rejects_bad_params() {
        let store = TxStore::new();

        for params in [
            vec![],
            vec![json!(42)],
            vec![json!("f00")],
            vec![json!("0x")],
            vec![json!("0xzz")],
            // valid hex, but not a decodable transaction
            vec![json!("0x0102")],
        ] {
            let response = send_raw_transaction(&store, request("eth_sendRawTransaction", params));
            assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn cancel_transaction_happy_path_and_idempotence() {
        let store = TxStore::new();
        let (hash, raw) = signed_raw_hex();
        send_raw_transaction(&store, request("eth_sendRawTransaction", vec![json!(raw)]));

        let response =
            cancel_transaction(&store, request("cancel_transaction", vec![json!(hash.to_hex())]));
        assert_eq!(response.result, Some(json!("Transaction canceled")));

        // A second cancel hits the state machine.
        let response =
            cancel_transaction(&store, request("cancel_transaction", vec![json!(hash.to_hex())]));
        let error = response.error.unwrap();
        assert_eq!(error.code, SERVER_ERROR);
        assert!(error.message.contains("invalid status transition"));
    }

    #[test]
    fn cancel_transaction_unknown_hash_is_not_found() {
        let store = TxStore::new();
        let hash = H256::keccak256(b"missing").to_hex();

        let response = cancel_transaction(&store, request("cancel_transaction", vec![json!(hash)]));

        let error = response.error.unwrap();
        assert_eq!(error.code, SERVER_ERROR);
        assert_eq!(error.message, "transaction not found");
    }

    #[test]
    fn cancel_transaction_rejects_bad_params() {
        let store = TxStore::new();

        for params in [vec![], vec![json!(42)], vec![json!("0x1234")]] {
            let response = cancel_transaction(&store, request("cancel_transaction", params));
            assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
        }
    }
}
