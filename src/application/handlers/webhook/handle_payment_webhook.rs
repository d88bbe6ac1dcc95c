//! HandlePaymentWebhookHandler - Gateway for payment provider webhooks.
//!
//! Every delivery runs the same five steps: verify the signature, check
//! the dedup window, dispatch on the typed event kind, record the event
//! id, acknowledge. Only a verification failure rejects the delivery;
//! everything after verification is acknowledged with HTTP 200 so the
//! provider stops redelivering, with the processing outcome reported in
//! the acknowledgement body.

use std::sync::Arc;

use crate::adapters::memory::IdempotencyGuard;
use crate::domain::purchase::Actor;
use crate::domain::webhook::{PaymentEvent, PaymentEventKind, WebhookError, WebhookVerifier};

use super::super::purchase::{
    CompletePurchaseCommand, CompletePurchaseHandler, FailPurchaseCommand, FailPurchaseHandler,
};

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as signed by the provider.
    pub payload: Vec<u8>,
    /// Signature header value.
    pub signature: String,
}

/// Processing outcome reported in the acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event changed purchase state (or idempotently confirmed it).
    Processed,
    /// The event id was within the dedup window; nothing ran.
    AlreadyProcessed,
    /// The event kind is not one we handle.
    Ignored,
    /// The event was understood but processing failed.
    Error {
        message: String,
        /// True when a later redelivery could succeed (storage failures).
        retryable: bool,
    },
}

/// Handler for processing payment provider webhooks.
pub struct HandlePaymentWebhookHandler {
    verifier: WebhookVerifier,
    guard: Arc<IdempotencyGuard>,
    complete: Arc<CompletePurchaseHandler>,
    fail: Arc<FailPurchaseHandler>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        guard: Arc<IdempotencyGuard>,
        complete: Arc<CompletePurchaseHandler>,
        fail: Arc<FailPurchaseHandler>,
    ) -> Self {
        Self {
            verifier,
            guard,
            complete,
            fail,
        }
    }

    /// Runs the five-step webhook flow.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError` only when verification fails; the caller
    /// maps that to an HTTP 400 rejection. Every verified delivery
    /// yields an `Ok` outcome.
    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        let event = self.verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        if self.guard.contains(&event.id) {
            tracing::debug!(event_id = %event.id, "duplicate webhook delivery skipped");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let outcome = self.dispatch(&event).await;

        // Transient failures stay unregistered so the provider's retry
        // can reach the handler again.
        let register = !matches!(
            outcome,
            WebhookOutcome::Error {
                retryable: true,
                ..
            }
        );
        if register {
            self.guard.register(&event.id);
        }

        Ok(outcome)
    }

    async fn dispatch(&self, event: &PaymentEvent) -> WebhookOutcome {
        match event.kind() {
            PaymentEventKind::PaymentSucceeded => self.on_payment_succeeded(event).await,
            PaymentEventKind::PaymentFailed => {
                self.on_payment_failed(event, "payment failed").await
            }
            PaymentEventKind::PaymentCanceled => {
                self.on_payment_failed(event, "payment canceled").await
            }
            PaymentEventKind::Unknown => {
                tracing::debug!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "unhandled webhook event kind"
                );
                WebhookOutcome::Ignored
            }
        }
    }

    async fn on_payment_succeeded(&self, event: &PaymentEvent) -> WebhookOutcome {
        let purchase_id = match event.purchase_id() {
            Ok(id) => id,
            Err(err) => return self.processing_error(event, err.to_string(), false),
        };

        let cmd = CompletePurchaseCommand {
            purchase_id,
            external_payment_id: event.payment_intent_id().map(str::to_string),
            payment_method: Some("card".to_string()),
            actor: Actor::System,
        };

        match self.complete.handle(cmd).await {
            Ok(_) => WebhookOutcome::Processed,
            Err(err) => {
                let retryable = err.is_retryable();
                self.processing_error(event, err.to_string(), retryable)
            }
        }
    }

    async fn on_payment_failed(&self, event: &PaymentEvent, default_reason: &str) -> WebhookOutcome {
        let purchase_id = match event.purchase_id() {
            Ok(id) => id,
            Err(err) => return self.processing_error(event, err.to_string(), false),
        };

        let reason = event
            .failure_message()
            .unwrap_or(default_reason)
            .to_string();
        let cmd = FailPurchaseCommand {
            purchase_id,
            reason: Some(reason),
            actor: Actor::System,
        };

        match self.fail.handle(cmd).await {
            Ok(_) => WebhookOutcome::Processed,
            Err(err) => {
                let retryable = err.is_retryable();
                self.processing_error(event, err.to_string(), retryable)
            }
        }
    }

    fn processing_error(
        &self,
        event: &PaymentEvent,
        message: String,
        retryable: bool,
    ) -> WebhookOutcome {
        tracing::error!(
            event_id = %event.id,
            event_type = %event.event_type,
            error = %message,
            retryable,
            "webhook processing failed"
        );
        WebhookOutcome::Error { message, retryable }
    }
}
