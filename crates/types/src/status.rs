//! Transaction lifecycle status and its transition rules.
//!
//! A held transaction starts as [`TxStatus::Stored`] and ends in exactly one
//! of the terminal states. The transition table is the single source of truth
//! for which status changes the store may apply.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a transaction held by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    /// Held in memory, waiting for an affordable gas price.
    Stored,
    /// Withdrawn before broadcast, either explicitly or by a cancel-style
    /// replacement.
    Canceled,
    /// Superseded by a replacement transaction at higher fee caps.
    SpedUp,
    /// Rejected by the upstream node; will not be retried.
    Failed,
    /// Forwarded to the upstream node.
    Broadcasted,
}

impl TxStatus {
    /// Returns the uppercase wire form used in JSON-RPC error messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Stored => "STORED",
            TxStatus::Canceled => "CANCELED",
            TxStatus::SpedUp => "SPEDUP",
            TxStatus::Failed => "FAILED",
            TxStatus::Broadcasted => "BROADCASTED",
        }
    }

    /// Checks whether the transition `self -> next` is allowed.
    ///
    /// `Canceled -> SpedUp` is permitted so that a wallet which canceled a
    /// transaction and later replaces it with a real one can still bump the
    /// predecessor through.
    pub fn can_transition_to(self, next: TxStatus) -> bool {
        use TxStatus::*;
        matches!(
            (self, next),
            (Stored, Canceled | SpedUp | Failed | Broadcasted) | (Canceled, SpedUp)
        )
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TxStatus::*;

    const ALL: [TxStatus; 5] = [Stored, Canceled, SpedUp, Failed, Broadcasted];

    #[test]
    fn stored_can_reach_every_other_status() {
        for next in [Canceled, SpedUp, Failed, Broadcasted] {
            assert!(Stored.can_transition_to(next), "Stored -> {next}");
        }
        assert!(!Stored.can_transition_to(Stored));
    }

    #[test]
    fn canceled_only_allows_speed_up() {
        for next in ALL {
            assert_eq!(
                Canceled.can_transition_to(next),
                next == SpedUp,
                "Canceled -> {next}"
            );
        }
    }

    #[test]
    fn terminal_states_allow_nothing() {
        for from in [SpedUp, Failed, Broadcasted] {
            for next in ALL {
                assert!(!from.can_transition_to(next), "{from} -> {next}");
            }
        }
    }

    #[test]
    fn wire_form() {
        assert_eq!(Stored.to_string(), "STORED");
        assert_eq!(SpedUp.to_string(), "SPEDUP");
        assert_eq!(Broadcasted.to_string(), "BROADCASTED");
    }
}
