//! Payment webhook gateway handler.

mod handle_payment_webhook;

pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, WebhookOutcome,
};
