//! Purchase aggregate entity.
//!
//! A Purchase records one user's acquisition of one premium trip. Each
//! (user, trip) pair has at most one purchase in a blocking status
//! (Pending or Completed); a Failed or Refunded purchase does not stop
//! the user from trying again with a fresh Purchase.
//!
//! # Design Decisions
//!
//! - **One active per (user, trip)**: partial unique index at database level
//! - **Money in cents**: `amount` is i64 cents, snapshotted from the trip
//!   price at creation and never recomputed afterwards
//! - **Fail-secure**: no completed purchase = no premium access
//! - **Audited transitions**: every state change pairs with an append-only
//!   transaction log entry written in the same storage transaction

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PurchaseId, StateMachine, Timestamp, TripId, UserId,
};
use serde::{Deserialize, Serialize};

use super::PurchaseStatus;

/// Purchase aggregate - one user's acquisition of one trip.
///
/// # Invariants
///
/// - `id` is globally unique
/// - at most one Pending/Completed purchase per (user_id, trip_id)
/// - status transitions follow the state machine rules
/// - `amount` never changes after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique identifier for this purchase.
    pub id: PurchaseId,

    /// User who is buying (or being gifted) the trip.
    pub user_id: UserId,

    /// Trip being purchased.
    pub trip_id: TripId,

    /// Price captured at creation time, in cents.
    pub amount: Money,

    /// Current status in the payment lifecycle.
    pub status: PurchaseStatus,

    /// How the purchase was paid ("card", "gift", ...), once known.
    pub payment_method: Option<String>,

    /// Identifier assigned by the payment provider.
    pub external_payment_id: Option<String>,

    /// When payment was confirmed (set on completion).
    pub purchased_at: Option<Timestamp>,

    /// When the purchase was created.
    pub created_at: Timestamp,

    /// When the purchase was last updated.
    pub updated_at: Timestamp,
}

impl Purchase {
    /// Create a new pending purchase awaiting payment confirmation.
    pub fn create(id: PurchaseId, user_id: UserId, trip_id: TripId, amount: Money) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            trip_id,
            amount,
            status: PurchaseStatus::Pending,
            payment_method: None,
            external_payment_id: None,
            purchased_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a gift purchase, already Completed with a zero amount.
    ///
    /// Gifts never pass through Pending; there is no payment to wait for.
    pub fn create_gift(id: PurchaseId, recipient_id: UserId, trip_id: TripId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id: recipient_id,
            trip_id,
            amount: Money::zero(),
            status: PurchaseStatus::Completed,
            payment_method: Some("gift".to_string()),
            external_payment_id: None,
            purchased_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this purchase grants access to the trip's premium content.
    pub fn grants_access(&self) -> bool {
        self.status.grants_access()
    }

    /// Mark payment as confirmed.
    ///
    /// # Errors
    ///
    /// Returns error if the purchase is not Pending.
    pub fn complete(
        &mut self,
        external_payment_id: Option<String>,
        payment_method: Option<String>,
    ) -> Result<(), DomainError> {
        self.transition_to(PurchaseStatus::Completed)?;
        if let Some(payment_id) = external_payment_id {
            self.external_payment_id = Some(payment_id);
        }
        if let Some(method) = payment_method {
            self.payment_method = Some(method);
        }
        let now = Timestamp::now();
        self.purchased_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Mark payment as failed or abandoned.
    ///
    /// # Errors
    ///
    /// Returns error if the purchase is not Pending.
    pub fn fail(&mut self) -> Result<(), DomainError> {
        self.transition_to(PurchaseStatus::Failed)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Refund a completed purchase, revoking access.
    ///
    /// # Errors
    ///
    /// Returns error if the purchase is not Completed. A second refund of
    /// the same purchase is an error, not a no-op.
    pub fn refund(&mut self) -> Result<(), DomainError> {
        self.transition_to(PurchaseStatus::Refunded)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: PurchaseStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition purchase from {} to {}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}
