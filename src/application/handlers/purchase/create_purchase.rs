//! CreatePurchaseHandler - Command handler for starting a purchase.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{PurchaseId, TripId, UserId};
use crate::domain::purchase::{Actor, Purchase, PurchaseError, TransactionEntry};
use crate::ports::{InsertOutcome, PurchaseLedger, TripCatalog};

/// Command to start a purchase for a trip.
#[derive(Debug, Clone)]
pub struct CreatePurchaseCommand {
    pub user_id: UserId,
    pub trip_id: TripId,
}

/// Handler for creating purchases.
///
/// Snapshots the trip price onto the new purchase and records the
/// Created audit entry in the same storage transaction. The ledger's
/// duplicate check is what serializes concurrent calls for the same
/// (user, trip) pair. Owners cannot buy their own trips; ownership
/// already grants access.
pub struct CreatePurchaseHandler {
    ledger: Arc<dyn PurchaseLedger>,
    catalog: Arc<dyn TripCatalog>,
}

impl CreatePurchaseHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>, catalog: Arc<dyn TripCatalog>) -> Self {
        Self { ledger, catalog }
    }

    pub async fn handle(&self, cmd: CreatePurchaseCommand) -> Result<Purchase, PurchaseError> {
        let trip = self
            .catalog
            .find_trip(&cmd.trip_id)
            .await?
            .ok_or(PurchaseError::TripNotFound(cmd.trip_id))?;

        if !trip.published {
            return Err(PurchaseError::trip_not_available(cmd.trip_id));
        }

        if trip.owner_id == cmd.user_id {
            return Err(PurchaseError::forbidden("You cannot buy your own trip"));
        }

        let purchase = Purchase::create(PurchaseId::new(), cmd.user_id, cmd.trip_id, trip.price);
        let entry = TransactionEntry::created(
            purchase.id,
            Actor::User(cmd.user_id),
            json!({ "amount": purchase.amount }),
        );

        match self.ledger.insert(&purchase, &entry).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    user_id = %cmd.user_id,
                    trip_id = %cmd.trip_id,
                    "purchase created"
                );
                Ok(purchase)
            }
            InsertOutcome::DuplicateActive => {
                Err(PurchaseError::duplicate(cmd.user_id, cmd.trip_id))
            }
        }
    }
}
