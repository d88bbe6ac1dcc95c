//! Purchase domain module.
//!
//! Handles the purchase lifecycle, the append-only audit log, and the
//! access decision for premium trip content.
//!
//! # Module Structure
//!
//! - `aggregate` - Purchase aggregate entity
//! - `status` - PurchaseStatus state machine
//! - `transaction` - Append-only audit log entries
//! - `errors` - Purchase-specific error types

mod aggregate;
mod errors;
mod status;
mod transaction;

pub use aggregate::Purchase;
pub use errors::PurchaseError;
pub use status::PurchaseStatus;
pub use transaction::{Actor, TransactionEntry, TransactionEventType};
