//! FailPurchaseHandler - Command handler for recording a failed payment.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::PurchaseId;
use crate::domain::purchase::{
    Actor, Purchase, PurchaseError, PurchaseStatus, TransactionEntry,
};
use crate::ports::{PurchaseLedger, TransitionOutcome};

/// Command to mark a purchase's payment as failed.
#[derive(Debug, Clone)]
pub struct FailPurchaseCommand {
    pub purchase_id: PurchaseId,
    pub reason: Option<String>,
    pub actor: Actor,
}

/// Result of a failure-recording attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPurchaseResult {
    /// The purchase moved from Pending to Failed.
    Failed(Purchase),
    /// The purchase was already Failed; nothing was written.
    AlreadyFailed(Purchase),
}

/// Handler for failing purchases.
///
/// Like completion, this is idempotent: a redelivered failure event for
/// an already Failed purchase reports success without another audit
/// entry. A Failed purchase is terminal; retrying payment means
/// creating a new purchase.
pub struct FailPurchaseHandler {
    ledger: Arc<dyn PurchaseLedger>,
}

impl FailPurchaseHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        cmd: FailPurchaseCommand,
    ) -> Result<FailPurchaseResult, PurchaseError> {
        let stored = self
            .ledger
            .find_by_id(&cmd.purchase_id)
            .await?
            .ok_or(PurchaseError::NotFound(cmd.purchase_id))?;

        if stored.status == PurchaseStatus::Failed {
            return Ok(FailPurchaseResult::AlreadyFailed(stored));
        }

        let mut purchase = stored;
        let expected = purchase.status;
        purchase
            .fail()
            .map_err(|_| PurchaseError::invalid_state(expected.as_str(), "fail"))?;

        let entry = TransactionEntry::failed(
            purchase.id,
            cmd.actor.clone(),
            json!({ "reason": cmd.reason }),
        );

        match self
            .ledger
            .apply_transition(&purchase, expected, &entry)
            .await?
        {
            TransitionOutcome::Applied => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    reason = cmd.reason.as_deref().unwrap_or("unspecified"),
                    "purchase failed"
                );
                Ok(FailPurchaseResult::Failed(purchase))
            }
            TransitionOutcome::StatusMismatch(PurchaseStatus::Failed) => {
                let current = self
                    .ledger
                    .find_by_id(&cmd.purchase_id)
                    .await?
                    .ok_or(PurchaseError::NotFound(cmd.purchase_id))?;
                Ok(FailPurchaseResult::AlreadyFailed(current))
            }
            TransitionOutcome::StatusMismatch(actual) => {
                Err(PurchaseError::invalid_state(actual.as_str(), "fail"))
            }
            TransitionOutcome::NotFound => Err(PurchaseError::not_found(cmd.purchase_id)),
        }
    }
}
