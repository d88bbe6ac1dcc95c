//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PurchaseLedger` - Durable purchase + audit log storage
//! - `TripCatalog` - Read-only view of the trip content service

mod purchase_ledger;
mod trip_catalog;

pub use purchase_ledger::{
    InsertOutcome, PageRequest, PurchaseFilter, PurchaseLedger, PurchasePage, TransitionOutcome,
};
pub use trip_catalog::{TripCatalog, TripSnapshot};
