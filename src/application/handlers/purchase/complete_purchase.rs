//! CompletePurchaseHandler - Command handler for confirming payment.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::PurchaseId;
use crate::domain::purchase::{
    Actor, Purchase, PurchaseError, PurchaseStatus, TransactionEntry,
};
use crate::ports::{PurchaseLedger, TransitionOutcome};

/// Command to mark a purchase's payment as confirmed.
#[derive(Debug, Clone)]
pub struct CompletePurchaseCommand {
    pub purchase_id: PurchaseId,
    pub external_payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub actor: Actor,
}

/// Result of a completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletePurchaseResult {
    /// The purchase moved from Pending to Completed.
    Completed(Purchase),
    /// The purchase was already Completed; nothing was written.
    AlreadyCompleted(Purchase),
}

impl CompletePurchaseResult {
    pub fn purchase(&self) -> &Purchase {
        match self {
            CompletePurchaseResult::Completed(p) => p,
            CompletePurchaseResult::AlreadyCompleted(p) => p,
        }
    }
}

/// Handler for completing purchases.
///
/// Completion is idempotent: a second call for an already Completed
/// purchase reports success without appending another audit entry.
/// The conditional transition keyed on Pending is what keeps two racing
/// callers from both writing; the loser re-reads the row and reports
/// the idempotent outcome.
pub struct CompletePurchaseHandler {
    ledger: Arc<dyn PurchaseLedger>,
}

impl CompletePurchaseHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        cmd: CompletePurchaseCommand,
    ) -> Result<CompletePurchaseResult, PurchaseError> {
        let stored = self
            .ledger
            .find_by_id(&cmd.purchase_id)
            .await?
            .ok_or(PurchaseError::NotFound(cmd.purchase_id))?;

        if stored.status == PurchaseStatus::Completed {
            return Ok(CompletePurchaseResult::AlreadyCompleted(stored));
        }

        let mut purchase = stored;
        let expected = purchase.status;
        purchase
            .complete(cmd.external_payment_id.clone(), cmd.payment_method.clone())
            .map_err(|_| PurchaseError::invalid_state(expected.as_str(), "complete"))?;

        let entry = TransactionEntry::completed(
            purchase.id,
            cmd.actor.clone(),
            json!({ "external_payment_id": cmd.external_payment_id }),
        );

        match self
            .ledger
            .apply_transition(&purchase, expected, &entry)
            .await?
        {
            TransitionOutcome::Applied => {
                tracing::info!(purchase_id = %purchase.id, "purchase completed");
                Ok(CompletePurchaseResult::Completed(purchase))
            }
            TransitionOutcome::StatusMismatch(PurchaseStatus::Completed) => {
                // Lost the race to another completion
                let current = self
                    .ledger
                    .find_by_id(&cmd.purchase_id)
                    .await?
                    .ok_or(PurchaseError::NotFound(cmd.purchase_id))?;
                Ok(CompletePurchaseResult::AlreadyCompleted(current))
            }
            TransitionOutcome::StatusMismatch(actual) => {
                Err(PurchaseError::invalid_state(actual.as_str(), "complete"))
            }
            TransitionOutcome::NotFound => Err(PurchaseError::not_found(cmd.purchase_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPurchaseLedger;
    use crate::domain::foundation::{Money, TripId, UserId};
    use crate::domain::purchase::TransactionEventType;

    async fn seeded_pending(ledger: &InMemoryPurchaseLedger) -> Purchase {
        let purchase = Purchase::create(
            PurchaseId::new(),
            UserId::new(),
            TripId::new(),
            Money::from_cents(1550),
        );
        let entry =
            TransactionEntry::created(purchase.id, Actor::User(purchase.user_id), json!({}));
        ledger.insert(&purchase, &entry).await.unwrap();
        purchase
    }

    fn complete_cmd(purchase_id: PurchaseId) -> CompletePurchaseCommand {
        CompletePurchaseCommand {
            purchase_id,
            external_payment_id: Some("pi_123".to_string()),
            payment_method: Some("card".to_string()),
            actor: Actor::System,
        }
    }

    #[tokio::test]
    async fn completes_pending_purchase() {
        let ledger = Arc::new(InMemoryPurchaseLedger::new());
        let purchase = seeded_pending(&ledger).await;
        let handler = CompletePurchaseHandler::new(ledger.clone());

        let result = handler.handle(complete_cmd(purchase.id)).await.unwrap();

        assert!(matches!(result, CompletePurchaseResult::Completed(_)));
        let stored = ledger.find_by_id(&purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseStatus::Completed);
        assert_eq!(stored.external_payment_id, Some("pi_123".to_string()));
        assert!(stored.purchased_at.is_some());
    }

    #[tokio::test]
    async fn appends_exactly_one_completed_entry() {
        let ledger = Arc::new(InMemoryPurchaseLedger::new());
        let purchase = seeded_pending(&ledger).await;
        let handler = CompletePurchaseHandler::new(ledger.clone());

        handler.handle(complete_cmd(purchase.id)).await.unwrap();

        let entries = ledger.list_transactions(&purchase.id).await.unwrap();
        let completed: Vec<_> = entries
            .iter()
            .filter(|e| e.event_type == TransactionEventType::Completed)
            .collect();
        assert_eq!(completed.len(), 1);
    }

    #[tokio::test]
    async fn second_completion_is_idempotent() {
        let ledger = Arc::new(InMemoryPurchaseLedger::new());
        let purchase = seeded_pending(&ledger).await;
        let handler = CompletePurchaseHandler::new(ledger.clone());

        handler.handle(complete_cmd(purchase.id)).await.unwrap();
        let result = handler.handle(complete_cmd(purchase.id)).await.unwrap();

        assert!(matches!(result, CompletePurchaseResult::AlreadyCompleted(_)));
        // Still exactly two entries: created + completed
        assert_eq!(ledger.list_transactions(&purchase.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cannot_complete_failed_purchase() {
        let ledger = Arc::new(InMemoryPurchaseLedger::new());
        let mut purchase = seeded_pending(&ledger).await;
        let expected = purchase.status;
        purchase.fail().unwrap();
        let entry = TransactionEntry::failed(purchase.id, Actor::System, json!({}));
        ledger.apply_transition(&purchase, expected, &entry).await.unwrap();

        let handler = CompletePurchaseHandler::new(ledger);
        let result = handler.handle(complete_cmd(purchase.id)).await;

        assert!(matches!(result, Err(PurchaseError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn unknown_purchase_is_not_found() {
        let ledger = Arc::new(InMemoryPurchaseLedger::new());
        let handler = CompletePurchaseHandler::new(ledger);

        let result = handler.handle(complete_cmd(PurchaseId::new())).await;

        assert!(matches!(result, Err(PurchaseError::NotFound(_))));
    }
}
