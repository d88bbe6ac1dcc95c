//! HTTP handlers for the purchase API.
//!
//! These handlers connect axum routes to the application layer
//! command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::access::{CheckAccessHandler, CheckAccessQuery};
use crate::application::handlers::admin::{ListPurchasesHandler, ListPurchasesQuery};
use crate::application::handlers::purchase::{
    CreatePurchaseCommand, CreatePurchaseHandler, GiftTripCommand, GiftTripHandler,
    PurchaseHistoryHandler, PurchaseHistoryQuery, RefundPurchaseCommand, RefundPurchaseHandler,
};
use crate::application::handlers::webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
};
use crate::domain::foundation::{PurchaseId, TripId, UserId};
use crate::domain::purchase::PurchaseError;
use crate::domain::webhook::WebhookError;
use crate::ports::{PageRequest, PurchaseFilter, PurchaseLedger};

use super::dto::{
    AccessResponse, CreatePurchaseRequest, ErrorResponse, GiftTripRequest, ListPurchasesParams,
    PurchaseListResponse, PurchasePageResponse, PurchaseResponse, RefundPurchaseRequest,
    TransactionEntryResponse, TransactionListResponse, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state.
///
/// Cloned per request; all handlers are Arc-wrapped and built once at
/// startup.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn PurchaseLedger>,
    pub create_purchase: Arc<CreatePurchaseHandler>,
    pub gift_trip: Arc<GiftTripHandler>,
    pub refund_purchase: Arc<RefundPurchaseHandler>,
    pub purchase_history: Arc<PurchaseHistoryHandler>,
    pub check_access: Arc<CheckAccessHandler>,
    pub list_purchases: Arc<ListPurchasesHandler>,
    pub webhook: Arc<HandlePaymentWebhookHandler>,
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// In production this would come from JWT/session middleware; for
/// development and tests an `X-User-Id` header carries the user id.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<UserId>().ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

/// Back-office operator context.
///
/// Carried in an `X-Admin-Id` header until a real role system lands.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin_id: UserId,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let admin_id = parts
            .headers
            .get("X-Admin-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<UserId>().ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AdminUser { admin_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Purchase Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/purchases - Start a purchase of a trip
pub async fn create_purchase(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreatePurchaseCommand {
        user_id: user.user_id,
        trip_id: request.trip_id,
    };

    let purchase = state.create_purchase.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PurchaseResponse::from(purchase))))
}

/// GET /api/purchases - The caller's purchase history
pub async fn purchase_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let query = PurchaseHistoryQuery {
        user_id: user.user_id,
    };

    let purchases = state.purchase_history.handle(query).await?;

    let response = PurchaseListResponse {
        purchases: purchases.into_iter().map(PurchaseResponse::from).collect(),
    };

    Ok(Json(response))
}

/// POST /api/purchases/:id/refund - Refund a completed purchase (admin)
pub async fn refund_purchase(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(purchase_id): Path<PurchaseId>,
    Json(request): Json<RefundPurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RefundPurchaseCommand {
        purchase_id,
        admin_id: admin.admin_id,
        reason: request.reason,
    };

    let purchase = state.refund_purchase.handle(cmd).await?;

    Ok(Json(PurchaseResponse::from(purchase)))
}

/// POST /api/trips/:id/gift - Gift a trip to another user
pub async fn gift_trip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(trip_id): Path<TripId>,
    Json(request): Json<GiftTripRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = GiftTripCommand {
        gifter_id: user.user_id,
        recipient_id: request.recipient_id,
        trip_id,
    };

    let purchase = state.gift_trip.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PurchaseResponse::from(purchase))))
}

/// GET /api/trips/:id/access - Check content access for the caller
pub async fn check_access(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(trip_id): Path<TripId>,
) -> Result<impl IntoResponse, ApiError> {
    let query = CheckAccessQuery {
        user_id: user.user_id,
        trip_id,
    };

    let decision = state.check_access.handle(query).await?;

    Ok(Json(AccessResponse::from(decision)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/purchases - Filtered, paginated purchase listing
pub async fn list_purchases(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ListPurchasesParams>,
) -> impl IntoResponse {
    let page = PageRequest {
        limit: params.limit.unwrap_or_else(|| PageRequest::default().limit),
        offset: params.offset.unwrap_or(0),
    };
    let query = ListPurchasesQuery {
        filter: PurchaseFilter {
            status: params.status,
            user_id: params.user_id,
            trip_id: params.trip_id,
            search: params.search,
        },
        page: Some(page),
    };

    let result = state.list_purchases.handle(query).await;

    Json(PurchasePageResponse::from_page(
        result,
        page.limit,
        page.offset,
    ))
}

/// GET /api/admin/purchases/:id/transactions - Audit log for a purchase
pub async fn purchase_transactions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(purchase_id): Path<PurchaseId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .ledger
        .find_by_id(&purchase_id)
        .await
        .map_err(PurchaseError::from)?
        .ok_or_else(|| PurchaseError::not_found(purchase_id))?;

    let entries = state
        .ledger
        .list_transactions(&purchase_id)
        .await
        .map_err(PurchaseError::from)?;

    let response = TransactionListResponse {
        transactions: entries
            .into_iter()
            .map(TransactionEntryResponse::from)
            .collect(),
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/payment - Handle payment provider webhooks
///
/// Every verified delivery is acknowledged with HTTP 200 and the
/// processing outcome in the body; only a verification failure is
/// rejected, with HTTP 400, so the provider retries it.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get("Webhook-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            WebhookError::ParseError("missing Webhook-Signature header".to_string())
        })?;

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let outcome = state.webhook.handle(cmd).await?;

    Ok(Json(WebhookAckResponse::from(outcome)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts purchase errors to HTTP responses.
pub struct ApiError(PurchaseError);

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        Self(err)
    }
}

impl From<crate::domain::foundation::DomainError> for ApiError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        Self(PurchaseError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            PurchaseError::NotFound(_) | PurchaseError::TripNotFound(_) => StatusCode::NOT_FOUND,
            PurchaseError::TripNotAvailable(_)
            | PurchaseError::Duplicate { .. }
            | PurchaseError::InvalidState { .. } => StatusCode::CONFLICT,
            PurchaseError::SelfGift | PurchaseError::ValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            PurchaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            PurchaseError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// Webhook rejection - verification failures only, always HTTP 400.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let error_code = match &self.0 {
            WebhookError::InvalidSignature => "INVALID_WEBHOOK_SIGNATURE",
            WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => {
                "WEBHOOK_TIMESTAMP_OUT_OF_RANGE"
            }
            WebhookError::ParseError(_) | WebhookError::MissingMetadata(_) => {
                "WEBHOOK_PARSE_ERROR"
            }
        };

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}
