//! # Feegate Client
//!
//! Outbound side of the feegate proxy:
//! - [`EthClient`] - one-shot JSON-RPC calls to the upstream execution node
//!   (`eth_gasPrice`, `eth_sendRawTransaction`) plus raw request forwarding
//!   for the pass-through proxy
//! - [`GasMonitor`] - the periodic task that broadcasts every stored
//!   transaction whose fee caps clear the current gas price
//!
//! The monitor is generic over the [`UpstreamRpc`] trait so tests can drive
//! it without a network.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod client;
pub mod monitor;

// Re-export main types at crate root
pub use client::{EthClient, UpstreamRpc, DEFAULT_REQUEST_TIMEOUT};
pub use monitor::{GasMonitor, DEFAULT_MONITOR_PERIOD};

/// Result type alias for upstream operations
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Errors from talking to the upstream execution node.
///
/// The split between [`UpstreamError::Rpc`] and everything else is
/// load-bearing: a JSON-RPC error means the chain rejected the payload and a
/// retry is futile, while transport-level failures are transient and the
/// affected transaction stays eligible for the next tick.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Network-level failure (connect, timeout, aborted request)
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-200 status
    #[error("unexpected http status code: {0}")]
    Http(reqwest::StatusCode),

    /// Upstream body was not a decodable JSON-RPC response
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Upstream returned a JSON-RPC error object; the message is preserved
    /// verbatim
    #[error("upstream rpc error: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message, verbatim
        message: String,
    },

    /// `eth_gasPrice` result was not a 0x-prefixed hex integer
    #[error("invalid gas price in upstream response: {0}")]
    InvalidGasPrice(String),
}

impl UpstreamError {
    /// Checks whether this error is a JSON-RPC rejection from the node, as
    /// opposed to a transport-level failure.
    pub fn is_rpc(&self) -> bool {
        matches!(self, UpstreamError::Rpc { .. })
    }
}
