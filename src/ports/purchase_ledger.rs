//! Purchase ledger port - durable storage for purchases and their audit log.
//!
//! The ledger is the single write path for purchase state. Implementations
//! must guarantee:
//!
//! - A state transition and its audit entry are persisted atomically; a
//!   transition is never visible without its log entry.
//! - Transitions are conditional on the caller's expected status. The
//!   update applies only if the stored row still has that status, so two
//!   racing writers cannot both move the same purchase.
//! - At most one Pending/Completed purchase per (user, trip) pair,
//!   enforced at insert time.

use crate::domain::foundation::{DomainError, PurchaseId, TripId, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus, TransactionEntry};
use async_trait::async_trait;

/// Result of inserting a new purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Purchase and its audit entry were persisted.
    Inserted,
    /// The user already has a Pending or Completed purchase for this trip.
    DuplicateActive,
}

/// Result of a conditional state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The stored row matched the expected status; the update and its
    /// audit entry were persisted.
    Applied,
    /// The stored row exists but has a different status. Carries the
    /// status actually observed, so callers can decide whether the
    /// operation was already done or genuinely invalid.
    StatusMismatch(PurchaseStatus),
    /// No purchase with this id exists.
    NotFound,
}

/// Filter for administrative purchase listings.
///
/// All fields are optional and combine with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseFilter {
    pub status: Option<PurchaseStatus>,
    pub user_id: Option<UserId>,
    pub trip_id: Option<TripId>,
    /// Free-text match against purchase id, external payment id, and
    /// payment method.
    pub search: Option<String>,
}

/// Pagination window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// One page of purchases plus the total matching count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePage {
    pub items: Vec<Purchase>,
    pub total: u64,
}

impl PurchasePage {
    /// An empty page with a zero total.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Storage port for purchase aggregates and their transaction log.
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Persist a new purchase together with its first audit entry.
    ///
    /// The entry is the Created (or Gifted) row; both writes happen in
    /// one atomic unit. Returns `DuplicateActive` instead of writing
    /// anything when an active purchase for the same (user, trip)
    /// already exists.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert(
        &self,
        purchase: &Purchase,
        entry: &TransactionEntry,
    ) -> Result<InsertOutcome, DomainError>;

    /// Apply a state transition conditionally.
    ///
    /// Writes the new state of `purchase` and appends `entry` only if
    /// the stored row still has `expected_status`. Both writes happen in
    /// one atomic unit; on `StatusMismatch` or `NotFound` nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn apply_transition(
        &self,
        purchase: &Purchase,
        expected_status: PurchaseStatus,
        entry: &TransactionEntry,
    ) -> Result<TransitionOutcome, DomainError>;

    /// Find a purchase by its id.
    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError>;

    /// Find the active (Pending or Completed) purchase for a (user, trip)
    /// pair, if one exists.
    async fn find_active(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
    ) -> Result<Option<Purchase>, DomainError>;

    /// All purchases belonging to a user, most recent first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, DomainError>;

    /// The audit log for a purchase, oldest first.
    async fn list_transactions(
        &self,
        purchase_id: &PurchaseId,
    ) -> Result<Vec<TransactionEntry>, DomainError>;

    /// Filtered, paginated listing for back-office use.
    async fn list_page(
        &self,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<PurchasePage, DomainError>;
}
