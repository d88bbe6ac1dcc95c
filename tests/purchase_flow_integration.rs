//! Integration tests for the purchase lifecycle.
//!
//! These tests run the application handlers against the in-memory
//! adapters and verify the end-to-end flows: paid checkout reconciled
//! by payment confirmation, refunds, gifting, duplicate prevention,
//! and the access decision derived from it all.

use std::sync::Arc;

use trailpass::adapters::memory::{InMemoryPurchaseLedger, InMemoryTripCatalog};
use trailpass::application::handlers::access::{AccessReason, CheckAccessHandler, CheckAccessQuery};
use trailpass::application::handlers::admin::{ListPurchasesHandler, ListPurchasesQuery};
use trailpass::application::handlers::purchase::{
    CompletePurchaseCommand, CompletePurchaseHandler, CompletePurchaseResult,
    CreatePurchaseCommand, CreatePurchaseHandler, FailPurchaseCommand, FailPurchaseHandler,
    GiftTripCommand, GiftTripHandler, RefundPurchaseCommand, RefundPurchaseHandler,
};
use trailpass::domain::foundation::{Money, TripId, UserId};
use trailpass::domain::purchase::{Actor, PurchaseError, PurchaseStatus, TransactionEventType};
use trailpass::ports::{PurchaseFilter, PurchaseLedger, TripCatalog, TripSnapshot};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    ledger: Arc<InMemoryPurchaseLedger>,
    catalog: Arc<InMemoryTripCatalog>,
    create: CreatePurchaseHandler,
    complete: CompletePurchaseHandler,
    fail: FailPurchaseHandler,
    refund: RefundPurchaseHandler,
    gift: GiftTripHandler,
    access: CheckAccessHandler,
    admin: ListPurchasesHandler,
}

impl TestApp {
    fn new() -> Self {
        let ledger = Arc::new(InMemoryPurchaseLedger::new());
        let catalog = Arc::new(InMemoryTripCatalog::new());
        let ledger_port: Arc<dyn PurchaseLedger> = ledger.clone();
        let catalog_port: Arc<dyn TripCatalog> = catalog.clone();

        Self {
            create: CreatePurchaseHandler::new(ledger_port.clone(), catalog_port.clone()),
            complete: CompletePurchaseHandler::new(ledger_port.clone()),
            fail: FailPurchaseHandler::new(ledger_port.clone()),
            refund: RefundPurchaseHandler::new(ledger_port.clone()),
            gift: GiftTripHandler::new(ledger_port.clone(), catalog_port.clone()),
            access: CheckAccessHandler::new(ledger_port.clone(), catalog_port),
            admin: ListPurchasesHandler::new(ledger_port),
            ledger,
            catalog,
        }
    }

    fn add_trip(&self, owner_id: UserId, price_cents: i64, published: bool) -> TripId {
        let trip_id = TripId::new();
        self.catalog.add_trip(TripSnapshot {
            id: trip_id,
            owner_id,
            price: Money::from_cents(price_cents),
            published,
        });
        trip_id
    }
}

// =============================================================================
// Paid Checkout Lifecycle
// =============================================================================

#[tokio::test]
async fn paid_checkout_completes_and_grants_access() {
    let app = TestApp::new();
    let owner = UserId::new();
    let buyer = UserId::new();
    let trip_id = app.add_trip(owner, 1550, true);

    let purchase = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(purchase.amount, Money::from_cents(1550));

    // No access while payment is pending.
    let decision = app
        .access
        .handle(CheckAccessQuery {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();
    assert!(!decision.granted);

    let result = app
        .complete
        .handle(CompletePurchaseCommand {
            purchase_id: purchase.id,
            external_payment_id: Some("pi_abc123".to_string()),
            payment_method: Some("card".to_string()),
            actor: Actor::System,
        })
        .await
        .unwrap();
    let completed = match result {
        CompletePurchaseResult::Completed(p) => p,
        CompletePurchaseResult::AlreadyCompleted(_) => panic!("expected a fresh completion"),
    };
    assert_eq!(completed.status, PurchaseStatus::Completed);
    assert!(completed.purchased_at.is_some());
    assert_eq!(completed.external_payment_id.as_deref(), Some("pi_abc123"));

    let decision = app
        .access
        .handle(CheckAccessQuery {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();
    assert!(decision.granted);
    assert_eq!(decision.reason, AccessReason::CompletedPurchase);

    let log = app.ledger.list_transactions(&purchase.id).await.unwrap();
    let events: Vec<_> = log.iter().map(|e| e.event_type).collect();
    assert_eq!(
        events,
        vec![TransactionEventType::Created, TransactionEventType::Completed]
    );
}

#[tokio::test]
async fn repeated_completion_adds_no_audit_rows() {
    let app = TestApp::new();
    let buyer = UserId::new();
    let trip_id = app.add_trip(UserId::new(), 2000, true);

    let purchase = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();

    let cmd = CompletePurchaseCommand {
        purchase_id: purchase.id,
        external_payment_id: Some("pi_1".to_string()),
        payment_method: Some("card".to_string()),
        actor: Actor::System,
    };
    app.complete.handle(cmd.clone()).await.unwrap();
    let second = app.complete.handle(cmd).await.unwrap();

    assert!(matches!(second, CompletePurchaseResult::AlreadyCompleted(_)));
    assert_eq!(app.ledger.list_transactions(&purchase.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn refund_is_not_idempotent() {
    let app = TestApp::new();
    let buyer = UserId::new();
    let admin = UserId::new();
    let trip_id = app.add_trip(UserId::new(), 1550, true);

    let purchase = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();
    app.complete
        .handle(CompletePurchaseCommand {
            purchase_id: purchase.id,
            external_payment_id: Some("pi_1".to_string()),
            payment_method: Some("card".to_string()),
            actor: Actor::System,
        })
        .await
        .unwrap();

    let refunded = app
        .refund
        .handle(RefundPurchaseCommand {
            purchase_id: purchase.id,
            admin_id: admin,
            reason: Some("customer request".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(refunded.status, PurchaseStatus::Refunded);

    // A refunded purchase no longer grants access.
    let decision = app
        .access
        .handle(CheckAccessQuery {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();
    assert!(!decision.granted);

    let again = app
        .refund
        .handle(RefundPurchaseCommand {
            purchase_id: purchase.id,
            admin_id: admin,
            reason: None,
        })
        .await;
    assert!(matches!(again, Err(PurchaseError::InvalidState { .. })));

    // Only one Refunded audit row exists.
    let log = app.ledger.list_transactions(&purchase.id).await.unwrap();
    let refunds = log
        .iter()
        .filter(|e| e.event_type == TransactionEventType::Refunded)
        .count();
    assert_eq!(refunds, 1);
}

// =============================================================================
// Duplicate Prevention
// =============================================================================

#[tokio::test]
async fn concurrent_creates_admit_exactly_one_purchase() {
    let app = TestApp::new();
    let buyer = UserId::new();
    let trip_id = app.add_trip(UserId::new(), 1000, true);

    let cmd = CreatePurchaseCommand {
        user_id: buyer,
        trip_id,
    };
    let (a, b) = tokio::join!(app.create.handle(cmd.clone()), app.create.handle(cmd));

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(loser, Err(PurchaseError::Duplicate { .. })));
    assert_eq!(app.ledger.purchases().len(), 1);
}

#[tokio::test]
async fn failed_purchase_does_not_block_a_retry() {
    let app = TestApp::new();
    let buyer = UserId::new();
    let trip_id = app.add_trip(UserId::new(), 1000, true);

    let first = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id,
        })
        .await
        .unwrap();
    app.fail
        .handle(FailPurchaseCommand {
            purchase_id: first.id,
            reason: Some("card declined".to_string()),
            actor: Actor::System,
        })
        .await
        .unwrap();

    let retry = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id,
        })
        .await;
    assert!(retry.is_ok());
    assert_eq!(app.ledger.purchases().len(), 2);
}

#[tokio::test]
async fn unpublished_trip_cannot_be_purchased() {
    let app = TestApp::new();
    let trip_id = app.add_trip(UserId::new(), 1000, false);

    let result = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: UserId::new(),
            trip_id,
        })
        .await;
    assert!(matches!(result, Err(PurchaseError::TripNotAvailable(_))));
}

// =============================================================================
// Gifting
// =============================================================================

#[tokio::test]
async fn gift_grants_immediate_access_at_zero_cost() {
    let app = TestApp::new();
    let gifter = UserId::new();
    let recipient = UserId::new();
    let trip_id = app.add_trip(UserId::new(), 4500, true);

    let purchase = app
        .gift
        .handle(GiftTripCommand {
            gifter_id: gifter,
            recipient_id: recipient,
            trip_id,
        })
        .await
        .unwrap();

    assert_eq!(purchase.status, PurchaseStatus::Completed);
    assert_eq!(purchase.user_id, recipient);
    assert!(purchase.amount.is_zero());
    assert_eq!(purchase.payment_method.as_deref(), Some("gift"));

    let decision = app
        .access
        .handle(CheckAccessQuery {
            user_id: recipient,
            trip_id,
        })
        .await
        .unwrap();
    assert!(decision.granted);

    let log = app.ledger.list_transactions(&purchase.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].event_type, TransactionEventType::Gifted);
    assert_eq!(log[0].actor, Actor::User(gifter));
}

#[tokio::test]
async fn self_gift_is_rejected() {
    let app = TestApp::new();
    let user = UserId::new();
    let trip_id = app.add_trip(UserId::new(), 1000, true);

    let result = app
        .gift
        .handle(GiftTripCommand {
            gifter_id: user,
            recipient_id: user,
            trip_id,
        })
        .await;
    assert!(matches!(result, Err(PurchaseError::SelfGift)));
    assert!(app.ledger.purchases().is_empty());
}

// =============================================================================
// Access
// =============================================================================

#[tokio::test]
async fn owner_has_access_without_any_purchase() {
    let app = TestApp::new();
    let owner = UserId::new();
    let trip_id = app.add_trip(owner, 1000, true);

    let decision = app
        .access
        .handle(CheckAccessQuery {
            user_id: owner,
            trip_id,
        })
        .await
        .unwrap();
    assert!(decision.granted);
    assert_eq!(decision.reason, AccessReason::Owner);
}

// =============================================================================
// Admin Listing
// =============================================================================

#[tokio::test]
async fn admin_listing_filters_by_status() {
    let app = TestApp::new();
    let buyer = UserId::new();
    let trip_a = app.add_trip(UserId::new(), 1000, true);
    let trip_b = app.add_trip(UserId::new(), 2000, true);

    let first = app
        .create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id: trip_a,
        })
        .await
        .unwrap();
    app.create
        .handle(CreatePurchaseCommand {
            user_id: buyer,
            trip_id: trip_b,
        })
        .await
        .unwrap();
    app.complete
        .handle(CompletePurchaseCommand {
            purchase_id: first.id,
            external_payment_id: Some("pi_1".to_string()),
            payment_method: Some("card".to_string()),
            actor: Actor::System,
        })
        .await
        .unwrap();

    let page = app
        .admin
        .handle(ListPurchasesQuery {
            filter: PurchaseFilter {
                status: Some(PurchaseStatus::Completed),
                ..Default::default()
            },
            page: None,
        })
        .await;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, first.id);
}

#[tokio::test]
async fn admin_listing_degrades_to_empty_page_on_storage_failure() {
    let app = TestApp::new();
    app.ledger.set_failing(true);

    let page = app
        .admin
        .handle(ListPurchasesQuery {
            filter: PurchaseFilter::default(),
            page: None,
        })
        .await;
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}
