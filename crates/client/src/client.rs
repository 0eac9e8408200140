//! JSON-RPC client for the upstream execution node.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Result, UpstreamError};

/// Default per-request timeout for upstream calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// The two upstream operations the transaction lifecycle depends on.
///
/// [`EthClient`] is the production implementation; tests substitute a mock
/// so the gas monitor can run without a network.
#[async_trait]
pub trait UpstreamRpc: Send + Sync {
    /// Queries `eth_gasPrice`, returning the suggested per-gas rate in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// Submits a raw transaction via `eth_sendRawTransaction`.
    ///
    /// A JSON-RPC error object from the node surfaces as
    /// [`UpstreamError::Rpc`]; everything else is a transport-level failure.
    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<()>;
}

/// HTTP JSON-RPC client bound to a single upstream URL.
///
/// Cancellation is cooperative: dropping an in-flight call future aborts the
/// underlying request, which is how the gas monitor interrupts its I/O.
#[derive(Debug, Clone)]
pub struct EthClient {
    http: reqwest::Client,
    url: String,
}

impl EthClient {
    /// Creates a client with the default request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Returns the configured upstream URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: 1,
        };

        let response = self.http.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http(status));
        }

        let body: JsonRpcResponse = serde_json::from_slice(&response.bytes().await?)?;

        if let Some(error) = body.error {
            return Err(UpstreamError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(body.result.unwrap_or(Value::Null))
    }

    /// Forwards an already-serialized JSON-RPC request body to the upstream
    /// node, returning the raw response for the pass-through proxy.
    pub async fn forward(&self, body: Bytes) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl UpstreamRpc for EthClient {
    async fn gas_price(&self) -> Result<u128> {
        let result = self.call("eth_gasPrice", Vec::new()).await?;
        parse_hex_quantity(&result)
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<()> {
        let result = self
            .call(
                "eth_sendRawTransaction",
                vec![Value::String(raw_hex.to_string())],
            )
            .await?;
        debug!(tx_hash = ?result, "transaction sent to upstream");
        Ok(())
    }
}

/// Parses a JSON-RPC quantity (`"0x..."` hex string) into wei.
fn parse_hex_quantity(value: &Value) -> Result<u128> {
    let text = value
        .as_str()
        .ok_or_else(|| UpstreamError::InvalidGasPrice(value.to_string()))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| UpstreamError::InvalidGasPrice(text.to_string()))?;
    u128::from_str_radix(digits, 16)
        .map_err(|_| UpstreamError::InvalidGasPrice(text.to_string()))
}
