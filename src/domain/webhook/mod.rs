//! Payment webhook domain module.
//!
//! Handles verification and typing of inbound payment provider events.
//!
//! # Module Structure
//!
//! - `event` - PaymentEvent payload types and event kind dispatch
//! - `verifier` - HMAC-SHA256 signature verification with replay protection
//! - `errors` - Verification-stage error types

mod errors;
mod event;
mod verifier;

pub use errors::WebhookError;
pub use event::{PaymentEvent, PaymentEventData, PaymentEventKind};
pub use verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use event::PaymentEventBuilder;
#[cfg(test)]
pub use verifier::sign_test_payload;
