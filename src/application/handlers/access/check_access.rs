//! CheckAccessHandler - Query handler for premium content access decisions.

use std::sync::Arc;

use crate::domain::foundation::{TripId, UserId};
use crate::domain::purchase::PurchaseError;
use crate::ports::{PurchaseLedger, TripCatalog};

/// Query asking whether a user may see a trip's premium content.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user_id: UserId,
    pub trip_id: TripId,
}

/// Why access was granted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// The user created the trip; owners never need a purchase.
    Owner,
    /// The user holds a Completed purchase for the trip.
    CompletedPurchase,
    /// No ownership and no completed purchase.
    NoAccess,
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub granted: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn granted(reason: AccessReason) -> Self {
        Self {
            granted: true,
            reason,
        }
    }

    fn denied() -> Self {
        Self {
            granted: false,
            reason: AccessReason::NoAccess,
        }
    }
}

/// Handler deciding premium content access.
///
/// Access is granted to the trip's owner or to a holder of a Completed
/// purchase; Pending, Failed, and Refunded purchases grant nothing.
/// This is the single decision point for gated rendering and downloads.
pub struct CheckAccessHandler {
    ledger: Arc<dyn PurchaseLedger>,
    catalog: Arc<dyn TripCatalog>,
}

impl CheckAccessHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>, catalog: Arc<dyn TripCatalog>) -> Self {
        Self { ledger, catalog }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<AccessDecision, PurchaseError> {
        let trip = self
            .catalog
            .find_trip(&query.trip_id)
            .await?
            .ok_or(PurchaseError::TripNotFound(query.trip_id))?;

        if trip.owner_id == query.user_id {
            return Ok(AccessDecision::granted(AccessReason::Owner));
        }

        let purchase = self
            .ledger
            .find_active(&query.user_id, &query.trip_id)
            .await?;

        match purchase {
            Some(p) if p.grants_access() => {
                Ok(AccessDecision::granted(AccessReason::CompletedPurchase))
            }
            _ => Ok(AccessDecision::denied()),
        }
    }
}
