//! # Feegate Store
//!
//! In-memory store of pending signed transactions for the feegate proxy.
//!
//! This crate owns the transaction lifecycle:
//! - The hash-keyed record map, sole authority over status mutation
//! - The status state machine ([`feegate_types::TxStatus`] transitions)
//! - The replacement classifier that reinterprets a newly submitted
//!   transaction as a cancel or speed-up of a stored predecessor
//! - The `ingest` and `cancel` entry points used by the JSON-RPC front-end
//!
//! Records are never deleted; terminal statuses persist for the process
//! lifetime. The store is volatile and cleared on restart.
//!
//! ## Example
//!
//! ```rust,ignore
//! use feegate_store::TxStore;
//!
//! let store = TxStore::new();
//! store.ingest(signed_tx, raw_hex)?;
//! store.cancel(&hash)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod store;

// Re-export main types at crate root
pub use store::{Ingested, TxRecord, TxStore};

use feegate_types::{TxStatus, H256};

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The transaction hash is already present; carries the stored status so
    /// callers can mimic the node's "already known" behavior
    #[error("already {0}")]
    Duplicate(TxStatus),

    /// No record with the given hash
    #[error("transaction not found")]
    NotFound,

    /// The requested status change is not in the transition table
    #[error("invalid status transition from {from} to {to} for transaction {hash}")]
    InvalidTransition {
        /// Hash of the record whose transition was rejected
        hash: H256,
        /// Current status
        from: TxStatus,
        /// Rejected target status
        to: TxStatus,
    },

    /// Sender recovery failed for the submitted transaction
    #[error("failed to recover sender: {0}")]
    SenderRecovery(#[source] feegate_types::Error),
}
