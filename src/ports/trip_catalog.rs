//! Trip catalog port - read-only view of the trip content service.
//!
//! Purchases reference trips owned by another part of the platform. This
//! port exposes the few trip facts the purchase flow needs: who owns the
//! trip, what it costs, and whether it is published for sale.

use crate::domain::foundation::{DomainError, Money, TripId, UserId};
use async_trait::async_trait;

/// Snapshot of a trip as seen by the purchase flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSnapshot {
    pub id: TripId,
    /// Creator of the trip; owners always have access to their own content.
    pub owner_id: UserId,
    /// Current list price in cents. Captured onto the purchase at creation.
    pub price: Money,
    /// Unpublished trips cannot be purchased or gifted.
    pub published: bool,
}

/// Read-only port for trip lookups.
#[async_trait]
pub trait TripCatalog: Send + Sync {
    /// Find a trip by its id.
    ///
    /// Returns `None` if no such trip exists.
    async fn find_trip(&self, trip_id: &TripId) -> Result<Option<TripSnapshot>, DomainError>;
}
