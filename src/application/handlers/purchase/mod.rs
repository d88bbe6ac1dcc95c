//! Purchase lifecycle command handlers.

mod complete_purchase;
mod create_purchase;
mod fail_purchase;
mod gift_trip;
mod purchase_history;
mod refund_purchase;

pub use complete_purchase::{
    CompletePurchaseCommand, CompletePurchaseHandler, CompletePurchaseResult,
};
pub use create_purchase::{CreatePurchaseCommand, CreatePurchaseHandler};
pub use fail_purchase::{FailPurchaseCommand, FailPurchaseHandler, FailPurchaseResult};
pub use gift_trip::{GiftTripCommand, GiftTripHandler};
pub use purchase_history::{PurchaseHistoryHandler, PurchaseHistoryQuery};
pub use refund_purchase::{RefundPurchaseCommand, RefundPurchaseHandler};
