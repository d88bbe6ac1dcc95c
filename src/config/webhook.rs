//! Webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Webhook configuration (payment provider)
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Webhook signing secret from the provider dashboard
    pub signing_secret: SecretString,

    /// Capacity of the event-id dedup window
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

impl WebhookConfig {
    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.signing_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK_SIGNING_SECRET"));
        }
        if !secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        if self.dedup_capacity == 0 {
            return Err(ValidationError::InvalidDedupCapacity);
        }
        Ok(())
    }
}

fn default_dedup_capacity() -> usize {
    1000
}
