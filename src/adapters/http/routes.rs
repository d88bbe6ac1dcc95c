//! Axum router configuration for the purchase API.
//!
//! Defines the route structure and wires each route to its handler.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    check_access, create_purchase, gift_trip, handle_payment_webhook, list_purchases,
    purchase_history, purchase_transactions, refund_purchase, AppState,
};

/// Create the user-facing purchase router.
///
/// # Routes
///
/// - `POST /purchases` - Start a purchase (authenticated)
/// - `GET /purchases` - The caller's purchase history (authenticated)
/// - `POST /trips/:id/gift` - Gift a trip (authenticated)
/// - `GET /trips/:id/access` - Content-access check (authenticated)
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(create_purchase).get(purchase_history))
        .route("/trips/:id/gift", post(gift_trip))
        .route("/trips/:id/access", get(check_access))
}

/// Create the back-office router.
///
/// # Routes
///
/// - `GET /purchases` - Filtered, paginated listing
/// - `POST /purchases/:id/refund` - Refund a completed purchase
/// - `GET /purchases/:id/transactions` - Audit log for a purchase
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_purchases))
        .route("/purchases/:id/refund", post(refund_purchase))
        .route("/purchases/:id/transactions", get(purchase_transactions))
}

/// Create the webhook router.
///
/// Separate from the user routes because webhook deliveries carry no
/// user authentication; they are verified via signature instead.
///
/// # Routes
///
/// - `POST /payment` - Handle payment provider webhooks
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}

/// Create the complete API router, suitable for mounting at `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(purchase_routes())
        .nest("/admin", admin_routes())
        .nest("/webhooks", webhook_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{IdempotencyGuard, InMemoryPurchaseLedger, InMemoryTripCatalog};
    use crate::application::handlers::access::CheckAccessHandler;
    use crate::application::handlers::admin::ListPurchasesHandler;
    use crate::application::handlers::purchase::{
        CompletePurchaseHandler, CreatePurchaseHandler, FailPurchaseHandler, GiftTripHandler,
        PurchaseHistoryHandler, RefundPurchaseHandler,
    };
    use crate::application::handlers::webhook::HandlePaymentWebhookHandler;
    use crate::domain::webhook::WebhookVerifier;
    use crate::ports::{PurchaseLedger, TripCatalog};

    fn test_state() -> AppState {
        let ledger: Arc<dyn PurchaseLedger> = Arc::new(InMemoryPurchaseLedger::new());
        let catalog: Arc<dyn TripCatalog> = Arc::new(InMemoryTripCatalog::new());
        let guard = Arc::new(IdempotencyGuard::with_capacity(16));

        let complete = Arc::new(CompletePurchaseHandler::new(ledger.clone()));
        let fail = Arc::new(FailPurchaseHandler::new(ledger.clone()));

        AppState {
            ledger: ledger.clone(),
            create_purchase: Arc::new(CreatePurchaseHandler::new(
                ledger.clone(),
                catalog.clone(),
            )),
            gift_trip: Arc::new(GiftTripHandler::new(ledger.clone(), catalog.clone())),
            refund_purchase: Arc::new(RefundPurchaseHandler::new(ledger.clone())),
            purchase_history: Arc::new(PurchaseHistoryHandler::new(ledger.clone())),
            check_access: Arc::new(CheckAccessHandler::new(ledger.clone(), catalog)),
            list_purchases: Arc::new(ListPurchasesHandler::new(ledger)),
            webhook: Arc::new(HandlePaymentWebhookHandler::new(
                WebhookVerifier::new("whsec_test"),
                guard,
                complete,
                fail,
            )),
        }
    }

    #[test]
    fn purchase_routes_creates_router() {
        let router = purchase_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn api_router_creates_combined_router() {
        let router = api_router();
        let _: Router<()> = router.with_state(test_state());
    }
}
