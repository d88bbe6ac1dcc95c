//! PostgreSQL adapters.
//!
//! Persistent implementations of the storage ports, backed by sqlx and
//! a shared connection pool. Schema lives in `migrations/`.

mod purchase_ledger;
mod trip_catalog;

pub use purchase_ledger::PostgresPurchaseLedger;
pub use trip_catalog::PostgresTripCatalog;
