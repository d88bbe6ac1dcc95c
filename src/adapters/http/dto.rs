//! HTTP DTOs for the purchase API.
//!
//! These types define the JSON request/response structure and form the
//! boundary between HTTP and the application layer.

use crate::application::handlers::access::{AccessDecision, AccessReason};
use crate::application::handlers::webhook::WebhookOutcome;
use crate::domain::foundation::{TripId, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus, TransactionEntry};
use crate::ports::PurchasePage;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a purchase of a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseRequest {
    /// The trip to purchase.
    pub trip_id: TripId,
}

/// Request to gift a trip to another user.
#[derive(Debug, Clone, Deserialize)]
pub struct GiftTripRequest {
    /// The user receiving the gift.
    pub recipient_id: UserId,
}

/// Request to refund a completed purchase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundPurchaseRequest {
    /// Optional operator-supplied reason, recorded in the audit log.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query parameters for the admin purchase listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPurchasesParams {
    #[serde(default)]
    pub status: Option<PurchaseStatus>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub trip_id: Option<TripId>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Purchase details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub id: String,
    pub user_id: String,
    pub trip_id: String,
    /// Amount in integer cents.
    pub amount_cents: i64,
    pub status: PurchaseStatus,
    pub payment_method: Option<String>,
    pub external_payment_id: Option<String>,
    /// When payment was confirmed (ISO 8601), if completed.
    pub purchased_at: Option<String>,
    /// When the purchase was created (ISO 8601).
    pub created_at: String,
}

impl From<Purchase> for PurchaseResponse {
    fn from(purchase: Purchase) -> Self {
        Self {
            id: purchase.id.to_string(),
            user_id: purchase.user_id.to_string(),
            trip_id: purchase.trip_id.to_string(),
            amount_cents: purchase.amount.cents(),
            status: purchase.status,
            payment_method: purchase.payment_method,
            external_payment_id: purchase.external_payment_id,
            purchased_at: purchase
                .purchased_at
                .map(|t| t.as_datetime().to_rfc3339()),
            created_at: purchase.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// A user's purchase history.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseResponse>,
}

/// One page of the admin purchase listing.
#[derive(Debug, Clone, Serialize)]
pub struct PurchasePageResponse {
    pub purchases: Vec<PurchaseResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl PurchasePageResponse {
    pub fn from_page(page: PurchasePage, limit: u32, offset: u32) -> Self {
        Self {
            purchases: page.items.into_iter().map(PurchaseResponse::from).collect(),
            total: page.total,
            limit,
            offset,
        }
    }
}

/// One audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionEntryResponse {
    pub id: String,
    pub event_type: String,
    pub actor: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl From<TransactionEntry> for TransactionEntryResponse {
    fn from(entry: TransactionEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            event_type: entry.event_type.as_str().to_string(),
            actor: entry.actor.as_str(),
            metadata: entry.metadata,
            created_at: entry.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// The audit log for one purchase.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionEntryResponse>,
}

/// Result of a content-access check.
#[derive(Debug, Clone, Serialize)]
pub struct AccessResponse {
    pub granted: bool,
    pub reason: &'static str,
}

impl From<AccessDecision> for AccessResponse {
    fn from(decision: AccessDecision) -> Self {
        let reason = match decision.reason {
            AccessReason::Owner => "owner",
            AccessReason::CompletedPurchase => "completed_purchase",
            AccessReason::NoAccess => "no_access",
        };
        Self {
            granted: decision.granted,
            reason,
        }
    }
}

/// Acknowledgement body returned for every verified webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<WebhookOutcome> for WebhookAckResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        match outcome {
            WebhookOutcome::Processed => Self {
                received: true,
                status: "processed",
                error: None,
            },
            WebhookOutcome::AlreadyProcessed => Self {
                received: true,
                status: "already_processed",
                error: None,
            },
            WebhookOutcome::Ignored => Self {
                received: true,
                status: "ignored",
                error: None,
            },
            WebhookOutcome::Error { message, .. } => Self {
                received: true,
                status: "error",
                error: Some(message),
            },
        }
    }
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
