//! Back-office query handlers.

mod list_purchases;

pub use list_purchases::{ListPurchasesHandler, ListPurchasesQuery};
