//! Append-only purchase transaction log.
//!
//! Every lifecycle transition of a purchase writes one `TransactionEntry`
//! in the same storage transaction as the status update. Entries are never
//! updated or deleted; they are the audit trail for dispute resolution.

use crate::domain::foundation::{PurchaseId, Timestamp, TransactionId, UserId};
use serde::{Deserialize, Serialize};

/// What happened to the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionEventType {
    Created,
    Completed,
    Failed,
    Refunded,
    Gifted,
}

impl TransactionEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionEventType::Created => "created",
            TransactionEventType::Completed => "completed",
            TransactionEventType::Failed => "failed",
            TransactionEventType::Refunded => "refunded",
            TransactionEventType::Gifted => "gifted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(TransactionEventType::Created),
            "completed" => Some(TransactionEventType::Completed),
            "failed" => Some(TransactionEventType::Failed),
            "refunded" => Some(TransactionEventType::Refunded),
            "gifted" => Some(TransactionEventType::Gifted),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who triggered the transition.
///
/// Stored as a single text column: `user:<uuid>`, `admin:<uuid>`, or
/// `system:webhook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Actor {
    /// The buyer themselves (checkout, gifting).
    User(UserId),

    /// A back-office operator (refunds).
    Admin(UserId),

    /// The payment-webhook pipeline.
    System,
}

impl Actor {
    pub fn as_str(&self) -> String {
        match self {
            Actor::User(id) => format!("user:{}", id),
            Actor::Admin(id) => format!("admin:{}", id),
            Actor::System => "system:webhook".to_string(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s == "system:webhook" {
            return Some(Actor::System);
        }
        let (kind, id) = s.split_once(':')?;
        let id: UserId = id.parse().ok()?;
        match kind {
            "user" => Some(Actor::User(id)),
            "admin" => Some(Actor::Admin(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable row in the purchase audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Unique identifier for this log entry.
    pub id: TransactionId,

    /// Purchase this entry belongs to.
    pub purchase_id: PurchaseId,

    /// What happened.
    pub event_type: TransactionEventType,

    /// Who triggered it.
    pub actor: Actor,

    /// Free-form context (provider payment id, refund reason, gifter id, ...).
    pub metadata: serde_json::Value,

    /// When the entry was recorded.
    pub created_at: Timestamp,
}

impl TransactionEntry {
    pub fn new(
        purchase_id: PurchaseId,
        event_type: TransactionEventType,
        actor: Actor,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            purchase_id,
            event_type,
            actor,
            metadata,
            created_at: Timestamp::now(),
        }
    }

    pub fn created(purchase_id: PurchaseId, actor: Actor, metadata: serde_json::Value) -> Self {
        Self::new(purchase_id, TransactionEventType::Created, actor, metadata)
    }

    pub fn completed(purchase_id: PurchaseId, actor: Actor, metadata: serde_json::Value) -> Self {
        Self::new(purchase_id, TransactionEventType::Completed, actor, metadata)
    }

    pub fn failed(purchase_id: PurchaseId, actor: Actor, metadata: serde_json::Value) -> Self {
        Self::new(purchase_id, TransactionEventType::Failed, actor, metadata)
    }

    pub fn refunded(purchase_id: PurchaseId, actor: Actor, metadata: serde_json::Value) -> Self {
        Self::new(purchase_id, TransactionEventType::Refunded, actor, metadata)
    }

    pub fn gifted(purchase_id: PurchaseId, actor: Actor, metadata: serde_json::Value) -> Self {
        Self::new(purchase_id, TransactionEventType::Gifted, actor, metadata)
    }
}
