//! In-memory adapters.
//!
//! The ledger and trip catalog serve tests and local development; the
//! ledger mirrors the transactional behavior of the postgres adapter.
//! The idempotency guard is the production dedup window.

mod idempotency_guard;
mod ledger;
mod trip_catalog;

pub use idempotency_guard::{IdempotencyGuard, DEFAULT_DEDUP_CAPACITY};
pub use ledger::InMemoryPurchaseLedger;
pub use trip_catalog::InMemoryTripCatalog;
