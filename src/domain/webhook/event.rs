//! Payment provider webhook event types.
//!
//! Defines the structures for parsing payment webhook payloads.
//! Only fields relevant to purchase reconciliation are captured.

use crate::domain::foundation::PurchaseId;
use serde::{Deserialize, Serialize};

use super::WebhookError;

/// Payment provider webhook event (simplified).
///
/// Contains the essential fields needed for webhook processing.
/// Additional fields from the provider's full event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: PaymentEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEventData {
    /// The object that triggered the event (a payment intent for the
    /// event kinds we handle).
    pub object: serde_json::Value,
}

impl PaymentEvent {
    /// Parse the event type into a known enum variant.
    pub fn kind(&self) -> PaymentEventKind {
        PaymentEventKind::from_str(&self.event_type)
    }

    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Purchase this event is about, from `data.object.metadata.purchase_id`.
    ///
    /// The checkout flow sets this metadata when creating the payment
    /// intent; an event without it cannot be reconciled.
    ///
    /// # Errors
    ///
    /// Returns `MissingMetadata` if the field is absent or not a valid id.
    pub fn purchase_id(&self) -> Result<PurchaseId, WebhookError> {
        self.data.object["metadata"]["purchase_id"]
            .as_str()
            .and_then(|raw| raw.parse().ok())
            .ok_or(WebhookError::MissingMetadata("purchase_id"))
    }

    /// Identifier of the payment intent this event carries, if present.
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.data.object["id"].as_str()
    }

    /// Failure message reported by the provider, if present.
    pub fn failure_message(&self) -> Option<&str> {
        self.data.object["last_payment_error"]["message"].as_str()
    }
}

/// Known payment event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// Payment was captured successfully.
    PaymentSucceeded,
    /// Payment attempt failed.
    PaymentFailed,
    /// Payment intent was canceled before capture.
    PaymentCanceled,
    /// Unknown or unhandled event type.
    Unknown,
}

impl PaymentEventKind {
    /// Parse event kind from the provider's type string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentFailed,
            "payment_intent.canceled" => Self::PaymentCanceled,
            _ => Self::Unknown,
        }
    }

    /// Convert to the provider's event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentSucceeded => "payment_intent.succeeded",
            Self::PaymentFailed => "payment_intent.payment_failed",
            Self::PaymentCanceled => "payment_intent.canceled",
            Self::Unknown => "unknown",
        }
    }
}

/// Builder for creating test PaymentEvent instances.
#[cfg(test)]
pub struct PaymentEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for PaymentEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "payment_intent.succeeded".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl PaymentEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn for_purchase(self, purchase_id: PurchaseId) -> Self {
        self.object(serde_json::json!({
            "id": "pi_test_123",
            "metadata": { "purchase_id": purchase_id.to_string() }
        }))
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> PaymentEvent {
        PaymentEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: PaymentEventData { object: self.object },
            livemode: self.livemode,
        }
    }
}
