//! TrailPass server binary.
//!
//! Loads configuration, connects the database pool, wires the
//! application handlers to their adapters, and serves the axum router.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use trailpass::adapters::http::{api_router, AppState};
use trailpass::adapters::memory::IdempotencyGuard;
use trailpass::adapters::postgres::{PostgresPurchaseLedger, PostgresTripCatalog};
use trailpass::application::handlers::access::CheckAccessHandler;
use trailpass::application::handlers::admin::ListPurchasesHandler;
use trailpass::application::handlers::purchase::{
    CompletePurchaseHandler, CreatePurchaseHandler, FailPurchaseHandler, GiftTripHandler,
    PurchaseHistoryHandler, RefundPurchaseHandler,
};
use trailpass::application::handlers::webhook::HandlePaymentWebhookHandler;
use trailpass::config::AppConfig;
use trailpass::domain::webhook::WebhookVerifier;
use trailpass::ports::{PurchaseLedger, TripCatalog};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let state = build_state(&config, pool);

    let mut cors = CorsLayer::new();
    for origin in config.server.cors_origins_list() {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_state(config: &AppConfig, pool: sqlx::PgPool) -> AppState {
    let ledger: Arc<dyn PurchaseLedger> = Arc::new(PostgresPurchaseLedger::new(pool.clone()));
    let catalog: Arc<dyn TripCatalog> = Arc::new(PostgresTripCatalog::new(pool));
    let guard = Arc::new(IdempotencyGuard::with_capacity(
        config.webhook.dedup_capacity,
    ));

    let complete = Arc::new(CompletePurchaseHandler::new(ledger.clone()));
    let fail = Arc::new(FailPurchaseHandler::new(ledger.clone()));
    let verifier = WebhookVerifier::new(config.webhook.signing_secret.expose_secret().clone());

    AppState {
        ledger: ledger.clone(),
        create_purchase: Arc::new(CreatePurchaseHandler::new(ledger.clone(), catalog.clone())),
        gift_trip: Arc::new(GiftTripHandler::new(ledger.clone(), catalog.clone())),
        refund_purchase: Arc::new(RefundPurchaseHandler::new(ledger.clone())),
        purchase_history: Arc::new(PurchaseHistoryHandler::new(ledger.clone())),
        check_access: Arc::new(CheckAccessHandler::new(ledger.clone(), catalog)),
        list_purchases: Arc::new(ListPurchasesHandler::new(ledger)),
        webhook: Arc::new(HandlePaymentWebhookHandler::new(
            verifier, guard, complete, fail,
        )),
    }
}
