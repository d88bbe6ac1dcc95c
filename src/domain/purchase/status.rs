//! Purchase status state machine.
//!
//! A purchase starts Pending and moves through exactly one of three edges:
//! Pending -> Completed, Pending -> Failed, Completed -> Refunded.
//! Failed and Refunded are terminal; Completed is terminal except for the
//! single refund edge.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Status of a purchase in its payment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Awaiting payment confirmation. The sole initial state for paid purchases.
    Pending,

    /// Payment confirmed; grants access to premium content.
    Completed,

    /// Payment failed or was canceled. Terminal; retrying requires a new purchase.
    Failed,

    /// Completed purchase that was refunded by an admin. Terminal.
    Refunded,
}

impl PurchaseStatus {
    /// Returns true if this status blocks a new purchase for the same
    /// (user, trip) pair.
    ///
    /// Failed and Refunded purchases do not block a new attempt.
    pub fn is_active(&self) -> bool {
        matches!(self, PurchaseStatus::Pending | PurchaseStatus::Completed)
    }

    /// Returns true if this status grants access to premium content.
    ///
    /// Only Completed counts; a refund revokes access.
    pub fn grants_access(&self) -> bool {
        matches!(self, PurchaseStatus::Completed)
    }

    /// Storage/query representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
            PurchaseStatus::Refunded => "refunded",
        }
    }

    /// Parses the storage/query representation of the status.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PurchaseStatus::Pending),
            "completed" => Some(PurchaseStatus::Completed),
            "failed" => Some(PurchaseStatus::Failed),
            "refunded" => Some(PurchaseStatus::Refunded),
            _ => None,
        }
    }
}

impl StateMachine for PurchaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PurchaseStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PurchaseStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Completed => vec![Refunded],
            Failed | Refunded => vec![],
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
