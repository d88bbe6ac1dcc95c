//! Purchase-specific error types.
//!
//! Errors related to purchase creation, lifecycle transitions, gifting, and
//! access checks.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | TripNotFound | 404 |
//! | TripNotAvailable | 409 |
//! | Duplicate | 409 |
//! | InvalidState | 409 |
//! | SelfGift | 400 |
//! | Forbidden | 403 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId, TripId, UserId};

/// Purchase-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    /// Purchase was not found.
    NotFound(PurchaseId),

    /// Trip was not found in the catalog.
    TripNotFound(TripId),

    /// Trip exists but is not published for sale.
    TripNotAvailable(TripId),

    /// User already has a pending or completed purchase for this trip.
    Duplicate { user_id: UserId, trip_id: TripId },

    /// Requested transition is not allowed from the current status.
    InvalidState { current: String, attempted: String },

    /// Gifting a trip to yourself is not allowed.
    SelfGift,

    /// Caller is not allowed to perform this operation.
    Forbidden(String),

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl PurchaseError {
    pub fn not_found(id: PurchaseId) -> Self {
        PurchaseError::NotFound(id)
    }

    pub fn trip_not_found(trip_id: TripId) -> Self {
        PurchaseError::TripNotFound(trip_id)
    }

    pub fn trip_not_available(trip_id: TripId) -> Self {
        PurchaseError::TripNotAvailable(trip_id)
    }

    pub fn duplicate(user_id: UserId, trip_id: TripId) -> Self {
        PurchaseError::Duplicate { user_id, trip_id }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        PurchaseError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn self_gift() -> Self {
        PurchaseError::SelfGift
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PurchaseError::Forbidden(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PurchaseError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PurchaseError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PurchaseError::NotFound(_) => ErrorCode::PurchaseNotFound,
            PurchaseError::TripNotFound(_) => ErrorCode::TripNotFound,
            PurchaseError::TripNotAvailable(_) => ErrorCode::TripNotAvailable,
            PurchaseError::Duplicate { .. } => ErrorCode::DuplicatePurchase,
            PurchaseError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PurchaseError::SelfGift => ErrorCode::ValidationFailed,
            PurchaseError::Forbidden(_) => ErrorCode::Forbidden,
            PurchaseError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PurchaseError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            PurchaseError::NotFound(id) => format!("Purchase not found: {}", id),
            PurchaseError::TripNotFound(trip_id) => format!("Trip not found: {}", trip_id),
            PurchaseError::TripNotAvailable(trip_id) => {
                format!("Trip {} is not available for purchase", trip_id)
            }
            PurchaseError::Duplicate { user_id, trip_id } => format!(
                "User {} already has an active purchase for trip {}",
                user_id, trip_id
            ),
            PurchaseError::InvalidState { current, attempted } => {
                format!("Cannot {} purchase in {} state", attempted, current)
            }
            PurchaseError::SelfGift => "Cannot gift a trip to yourself".to_string(),
            PurchaseError::Forbidden(msg) => msg.clone(),
            PurchaseError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PurchaseError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PurchaseError::Infrastructure(_))
    }
}

impl std::fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PurchaseError {}

impl From<DomainError> for PurchaseError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => PurchaseError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.to_string(),
            },
            ErrorCode::ValidationFailed => PurchaseError::ValidationFailed {
                field: "unknown".to_string(),
                message: err.to_string(),
            },
            _ => PurchaseError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PurchaseError> for DomainError {
    fn from(err: PurchaseError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
