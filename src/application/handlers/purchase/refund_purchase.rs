//! RefundPurchaseHandler - Command handler for refunding a completed purchase.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{PurchaseId, UserId};
use crate::domain::purchase::{Actor, Purchase, PurchaseError, TransactionEntry};
use crate::ports::{PurchaseLedger, TransitionOutcome};

/// Command to refund a completed purchase.
#[derive(Debug, Clone)]
pub struct RefundPurchaseCommand {
    pub purchase_id: PurchaseId,
    pub admin_id: UserId,
    pub reason: Option<String>,
}

/// Handler for refunding purchases.
///
/// Refunds are deliberate admin actions and are NOT idempotent: a
/// second refund of the same purchase is an error, since it would mean
/// money moving twice. Only a Completed purchase can be refunded.
pub struct RefundPurchaseHandler {
    ledger: Arc<dyn PurchaseLedger>,
}

impl RefundPurchaseHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, cmd: RefundPurchaseCommand) -> Result<Purchase, PurchaseError> {
        let stored = self
            .ledger
            .find_by_id(&cmd.purchase_id)
            .await?
            .ok_or(PurchaseError::NotFound(cmd.purchase_id))?;

        let mut purchase = stored;
        let expected = purchase.status;
        purchase
            .refund()
            .map_err(|_| PurchaseError::invalid_state(expected.as_str(), "refund"))?;

        let entry = TransactionEntry::refunded(
            purchase.id,
            Actor::Admin(cmd.admin_id),
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
                    admin_id = %cmd.admin_id,
                    "purchase refunded"
                );
                Ok(purchase)
            }
            TransitionOutcome::StatusMismatch(actual) => {
                Err(PurchaseError::invalid_state(actual.as_str(), "refund"))
            }
            TransitionOutcome::NotFound => Err(PurchaseError::not_found(cmd.purchase_id)),
        }
    }
}
