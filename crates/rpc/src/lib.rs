//! # Feegate RPC
//!
//! The inbound JSON-RPC front-end of the feegate proxy.
//!
//! A single POST endpoint decodes every request and dispatches two methods
//! locally:
//! - `eth_sendRawTransaction` - decoded and handed to the store's ingest
//!   path instead of being broadcast; the caller receives the transaction
//!   hash exactly as a node would answer
//! - `cancel_transaction` - feegate-specific; withdraws a held transaction
//!
//! Every other method is forwarded verbatim to the upstream node and its
//! response relayed back unchanged.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod eth;
pub mod server;
pub mod types;

// Re-export main types at crate root
pub use server::{router, serve, AppState};
pub use types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
