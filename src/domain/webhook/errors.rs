//! Webhook error types for payment provider webhook handling.
//!
//! These cover the verification stage only. Once a payload is verified,
//! processing failures are reported inside the acknowledgement body and
//! the delivery is still accepted with HTTP 200.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur before a webhook delivery is accepted.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from webhook event.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// A rejected delivery is never acknowledged; the provider will retry
    /// until the signature or payload is valid.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_) => StatusCode::BAD_REQUEST,
        }
    }
}
