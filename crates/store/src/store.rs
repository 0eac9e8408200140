//! The transaction store and replacement classifier.
//!
//! All mutation goes through [`TxStore::ingest`], [`TxStore::cancel`], and
//! [`TxStore::change_status`]. A single lock guards the record map; `ingest`
//! holds it for its whole duplicate-check / predecessor-scan / insert
//! sequence so that classification decisions are made against a consistent
//! snapshot.

use std::collections::HashMap;

use feegate_types::{SignedTransaction, TxStatus, H256};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{Result, StoreError};

/// A stored transaction: the decoded payload, its lifecycle status, and the
/// original `0x`-prefixed hex submitted by the wallet, retained verbatim for
/// later broadcast.
#[derive(Debug, Clone)]
pub struct TxRecord {
    /// The decoded signed transaction
    pub tx: SignedTransaction,
    /// Current lifecycle status
    pub status: TxStatus,
    /// Raw hex encoding as submitted
    pub raw_hex: String,
}

impl TxRecord {
    fn stored(tx: SignedTransaction, raw_hex: String) -> Self {
        Self {
            tx,
            status: TxStatus::Stored,
            raw_hex,
        }
    }
}

/// Outcome of an [`TxStore::ingest`] call, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// Stored as a fresh record.
    Stored,
    /// Recognized as a cancel-style replacement and dropped. `predecessor`
    /// names the record flipped to `Canceled`; it is `None` when every
    /// matching predecessor had already left a cancellable status.
    Canceled {
        /// Hash of the canceled predecessor, if one was flipped
        predecessor: Option<H256>,
    },
    /// Recognized as a speed-up: the predecessor moved to `SpedUp` and the
    /// new transaction was stored in its place.
    SpedUp {
        /// Hash of the superseded predecessor
        predecessor: H256,
    },
}

/// Thread-safe in-memory transaction store.
///
/// Callers share it behind an `Arc`. Reads and writes all go through the
/// internal lock; no method holds the lock across I/O.
#[derive(Debug, Default)]
pub struct TxStore {
    records: RwLock<HashMap<H256, TxRecord>>,
}

impl TxStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a newly submitted transaction, classifying it against the
    /// stored records of the same sender and nonce.
    ///
    /// A cancel-style replacement (zero-value self-send at strictly higher
    /// fee caps with empty calldata) flips its predecessor to `Canceled` and
    /// is itself dropped: broadcasting it would only burn gas, and the
    /// user's intent is recorded in the predecessor's status. A speed-up
    /// (same recipient, value, and calldata at strictly higher caps) flips
    /// the predecessor to `SpedUp` and stores the new transaction. Anything
    /// else is stored as a fresh record.
    pub fn ingest(&self, tx: SignedTransaction, raw_hex: String) -> Result<Ingested> {
        let hash = tx.hash();
        let mut records = self.records.write();

        if let Some(existing) = records.get(&hash) {
            return Err(StoreError::Duplicate(existing.status));
        }

        let new_sender = tx.sender().map_err(StoreError::SenderRecovery)?;
        let new_cap = tx.fee_cap_total();

        // The map cannot be mutated while iterating it, so scan a snapshot
        // of the keys and re-look each record up.
        let hashes: Vec<H256> = records.keys().copied().collect();
        let mut cancel_matched = false;

        for old_hash in hashes {
            let (is_cancel, is_speed_up) = {
                let Some(old) = records.get(&old_hash) else {
                    continue;
                };
                // A SPEDUP record has already been replaced; matches should
                // target the live successor that superseded it.
                if old.status == TxStatus::SpedUp {
                    continue;
                }
                let old_sender = match old.tx.sender() {
                    Ok(sender) => sender,
                    Err(err) => {
                        debug!(tx_hash = %old_hash, error = %err, "skipping stored record with unrecoverable sender");
                        continue;
                    }
                };
                if old_sender != new_sender || old.tx.nonce() != tx.nonce() {
                    continue;
                }

                let old_cap = old.tx.fee_cap_total();
                let is_cancel = tx.to() == Some(new_sender)
                    && tx.value() == 0
                    && new_cap > old_cap
                    && tx.data().is_empty();
                let is_speed_up = tx.to() == old.tx.to()
                    && tx.value() == old.tx.value()
                    && new_cap > old_cap
                    && tx.data() == old.tx.data();
                (is_cancel, is_speed_up)
            };

            if is_cancel {
                cancel_matched = true;
                // Keep scanning on a rejected transition: a chain of
                // cancel-and-resubmit at the same nonce leaves earlier
                // predecessors already CANCELED.
                if Self::transition(&mut records, old_hash, TxStatus::Canceled).is_ok() {
                    info!(tx_hash = %old_hash, "canceled transaction");
                    return Ok(Ingested::Canceled {
                        predecessor: Some(old_hash),
                    });
                }
                continue;
            }

            if is_speed_up {
                Self::transition(&mut records, old_hash, TxStatus::SpedUp)?;
                records.insert(hash, TxRecord::stored(tx, raw_hex));
                info!(tx_hash = %old_hash, successor = %hash, "sped up transaction");
                return Ok(Ingested::SpedUp {
                    predecessor: old_hash,
                });
            }
        }

        if cancel_matched {
            // The cancel matched but no predecessor could be flipped; the
            // transaction is still dropped rather than broadcast.
            return Ok(Ingested::Canceled { predecessor: None });
        }

        records.insert(hash, TxRecord::stored(tx, raw_hex));
        info!(tx_hash = %hash, "stored transaction");
        Ok(Ingested::Stored)
    }

    /// Moves a stored transaction to `Canceled`.
    pub fn cancel(&self, hash: &H256) -> Result<()> {
        self.change_status(hash, TxStatus::Canceled)?;
        info!(tx_hash = %hash, "canceled transaction");
        Ok(())
    }

    /// Applies a status transition, enforcing the transition table.
    ///
    /// Fails with [`StoreError::NotFound`] for unknown hashes and
    /// [`StoreError::InvalidTransition`] for disallowed transitions; the
    /// store is unchanged on error.
    pub fn change_status(&self, hash: &H256, next: TxStatus) -> Result<()> {
        let mut records = self.records.write();
        Self::transition(&mut records, *hash, next)
    }

    fn transition(
        records: &mut HashMap<H256, TxRecord>,
        hash: H256,
        next: TxStatus,
    ) -> Result<()> {
        let record = records.get_mut(&hash).ok_or(StoreError::NotFound)?;
        if !record.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                hash,
                from: record.status,
                to: next,
            });
        }
        record.status = next;
        Ok(())
    }

    /// Returns the status of a record, if present.
    pub fn status(&self, hash: &H256) -> Option<TxStatus> {
        self.records.read().get(hash).map(|r| r.status)
    }

    /// Returns a copy of a record, if present.
    pub fn get(&self, hash: &H256) -> Option<TxRecord> {
        self.records.read().get(hash).cloned()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Checks whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshots the `Stored` records whose summed fee caps meet the given
    /// gas price.
    ///
    /// The gas monitor broadcasts from this snapshot after releasing the
    /// lock, then reports results back through [`TxStore::change_status`];
    /// holding the lock across the network call would stall request
    /// handlers behind a slow upstream.
    pub fn broadcast_candidates(&self, gas_price: u128) -> Vec<(H256, String)> {
        self.records
            .read()
            .iter()
            .filter(|(_, record)| {
                record.status == TxStatus::Stored && record.tx.fee_cap_total() >= gas_price
            })
            .map(|(hash, record)| (*hash, record.raw_hex.clone()))
            .collect()
    }
}
