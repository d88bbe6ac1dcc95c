//! GiftTripHandler - Command handler for gifting a trip to another user.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{PurchaseId, TripId, UserId};
use crate::domain::purchase::{Actor, Purchase, PurchaseError, TransactionEntry};
use crate::ports::{InsertOutcome, PurchaseLedger, TripCatalog};

/// Command to gift a trip to another user.
#[derive(Debug, Clone)]
pub struct GiftTripCommand {
    pub gifter_id: UserId,
    pub recipient_id: UserId,
    pub trip_id: TripId,
}

/// Handler for gifting trips.
///
/// A gift is recorded as a Completed purchase owned by the recipient
/// with a zero amount, inserted atomically with its Gifted audit entry.
/// The gifter is captured in the entry metadata. The recipient's
/// one-active-purchase rule applies to gifts like any other purchase,
/// and the trip's owner can be neither bought for nor gifted to.
pub struct GiftTripHandler {
    ledger: Arc<dyn PurchaseLedger>,
    catalog: Arc<dyn TripCatalog>,
}

impl GiftTripHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>, catalog: Arc<dyn TripCatalog>) -> Self {
        Self { ledger, catalog }
    }

    pub async fn handle(&self, cmd: GiftTripCommand) -> Result<Purchase, PurchaseError> {
        if cmd.gifter_id == cmd.recipient_id {
            return Err(PurchaseError::self_gift());
        }

        let trip = self
            .catalog
            .find_trip(&cmd.trip_id)
            .await?
            .ok_or(PurchaseError::TripNotFound(cmd.trip_id))?;

        if !trip.published {
            return Err(PurchaseError::trip_not_available(cmd.trip_id));
        }

        if cmd.recipient_id == trip.owner_id {
            return Err(PurchaseError::forbidden(
                "You cannot gift a trip to its owner",
            ));
        }

        let purchase = Purchase::create_gift(PurchaseId::new(), cmd.recipient_id, cmd.trip_id);
        let entry = TransactionEntry::gifted(
            purchase.id,
            Actor::User(cmd.gifter_id),
            json!({ "gifter_id": cmd.gifter_id }),
        );

        match self.ledger.insert(&purchase, &entry).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    gifter_id = %cmd.gifter_id,
                    recipient_id = %cmd.recipient_id,
                    trip_id = %cmd.trip_id,
                    "trip gifted"
                );
                Ok(purchase)
            }
            InsertOutcome::DuplicateActive => {
                Err(PurchaseError::duplicate(cmd.recipient_id, cmd.trip_id))
            }
        }
    }
}
