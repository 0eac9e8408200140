//! # Feegate Types
//!
//! Core type definitions for the feegate transaction-holding proxy:
//! - [`Address`] - Ethereum-compatible 20-byte addresses
//! - [`H256`] - 32-byte Keccak256 hashes
//! - [`Transaction`] and [`SignedTransaction`] - EIP-1559 transactions with
//!   RLP encoding and ECDSA sender recovery
//! - [`TxStatus`] - the lifecycle state of a held transaction and its
//!   allowed transitions
//!
//! ## Example
//!
//! ```rust
//! use feegate_types::{H256, TxStatus};
//!
//! let hash = H256::keccak256(b"raw transaction bytes");
//! assert!(!hash.is_zero());
//! assert!(TxStatus::Stored.can_transition_to(TxStatus::Broadcasted));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod address;
pub mod hash;
pub mod status;
pub mod transaction;

// Re-export main types at crate root
pub use address::Address;
pub use hash::H256;
pub use status::TxStatus;
pub use transaction::{AccessListItem, Signature, SignedTransaction, Transaction, TxType};

/// Result type alias for feegate type operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with feegate types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Invalid length for a fixed-size type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid address format
    #[error("invalid address format: {0}")]
    InvalidAddress(String),

    /// Invalid hash format
    #[error("invalid hash format: {0}")]
    InvalidHash(String),

    /// Invalid transaction payload
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// RLP decoding error
    #[error("RLP decode error: {0}")]
    RlpDecode(#[from] rlp::DecoderError),

    /// Signature or sender-recovery error
    #[error("signature error: {0}")]
    Signature(String),
}
