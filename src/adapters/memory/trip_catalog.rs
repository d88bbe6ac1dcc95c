//! In-memory trip catalog for tests and local development.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TripId};
use crate::ports::{TripCatalog, TripSnapshot};

/// In-memory `TripCatalog` implementation.
#[derive(Default)]
pub struct InMemoryTripCatalog {
    trips: Mutex<Vec<TripSnapshot>>,
}

impl InMemoryTripCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trips(trips: Vec<TripSnapshot>) -> Self {
        Self {
            trips: Mutex::new(trips),
        }
    }

    pub fn add_trip(&self, trip: TripSnapshot) {
        self.trips.lock().unwrap().push(trip);
    }
}

#[async_trait]
impl TripCatalog for InMemoryTripCatalog {
    async fn find_trip(&self, trip_id: &TripId) -> Result<Option<TripSnapshot>, DomainError> {
        let trips = self.trips.lock().unwrap();
        Ok(trips.iter().find(|t| t.id == *trip_id).cloned())
    }
}
