//! In-memory purchase ledger for tests and local development.
//!
//! Mirrors the transactional guarantees of the postgres adapter: an
//! insert or transition either applies together with its audit entry or
//! not at all, and transitions are conditional on the expected status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PurchaseId, TripId, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus, TransactionEntry};
use crate::ports::{
    InsertOutcome, PageRequest, PurchaseFilter, PurchaseLedger, PurchasePage, TransitionOutcome,
};

#[derive(Default)]
struct LedgerState {
    purchases: Vec<Purchase>,
    transactions: Vec<TransactionEntry>,
}

/// In-memory `PurchaseLedger` implementation.
#[derive(Default)]
pub struct InMemoryPurchaseLedger {
    state: Mutex<LedgerState>,
    failing: AtomicBool,
}

impl InMemoryPurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every operation fails with a database error. Used to
    /// exercise storage-degradation paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of all stored purchases (test inspection).
    pub fn purchases(&self) -> Vec<Purchase> {
        self.state.lock().unwrap().purchases.clone()
    }

    /// Snapshot of all stored audit entries (test inspection).
    pub fn transactions(&self) -> Vec<TransactionEntry> {
        self.state.lock().unwrap().transactions.clone()
    }

    fn check_failing(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::database("simulated storage failure"));
        }
        Ok(())
    }
}

fn matches_filter(purchase: &Purchase, filter: &PurchaseFilter) -> bool {
    if let Some(status) = filter.status {
        if purchase.status != status {
            return false;
        }
    }
    if let Some(user_id) = filter.user_id {
        if purchase.user_id != user_id {
            return false;
        }
    }
    if let Some(trip_id) = filter.trip_id {
        if purchase.trip_id != trip_id {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let id_match = purchase.id.to_string().contains(&needle);
        let payment_match = purchase
            .external_payment_id
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains(&needle));
        let method_match = purchase
            .payment_method
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains(&needle));
        if !(id_match || payment_match || method_match) {
            return false;
        }
    }
    true
}

#[async_trait]
impl PurchaseLedger for InMemoryPurchaseLedger {
    async fn insert(
        &self,
        purchase: &Purchase,
        entry: &TransactionEntry,
    ) -> Result<InsertOutcome, DomainError> {
        self.check_failing()?;
        let mut state = self.state.lock().unwrap();

        let duplicate = state.purchases.iter().any(|existing| {
            existing.user_id == purchase.user_id
                && existing.trip_id == purchase.trip_id
                && existing.status.is_active()
        });
        if duplicate {
            return Ok(InsertOutcome::DuplicateActive);
        }

        state.purchases.push(purchase.clone());
        state.transactions.push(entry.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn apply_transition(
        &self,
        purchase: &Purchase,
        expected_status: PurchaseStatus,
        entry: &TransactionEntry,
    ) -> Result<TransitionOutcome, DomainError> {
        self.check_failing()?;
        let mut state = self.state.lock().unwrap();

        let Some(stored) = state.purchases.iter_mut().find(|p| p.id == purchase.id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if stored.status != expected_status {
            return Ok(TransitionOutcome::StatusMismatch(stored.status));
        }

        *stored = purchase.clone();
        state.transactions.push(entry.clone());
        Ok(TransitionOutcome::Applied)
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        self.check_failing()?;
        let state = self.state.lock().unwrap();
        Ok(state.purchases.iter().find(|p| p.id == *id).cloned())
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
    ) -> Result<Option<Purchase>, DomainError> {
        self.check_failing()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .purchases
            .iter()
            .find(|p| p.user_id == *user_id && p.trip_id == *trip_id && p.status.is_active())
            .cloned())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, DomainError> {
        self.check_failing()?;
        let state = self.state.lock().unwrap();
        let mut purchases: Vec<Purchase> = state
            .purchases
            .iter()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }

    async fn list_transactions(
        &self,
        purchase_id: &PurchaseId,
    ) -> Result<Vec<TransactionEntry>, DomainError> {
        self.check_failing()?;
        let state = self.state.lock().unwrap();
        let mut entries: Vec<TransactionEntry> = state
            .transactions
            .iter()
            .filter(|t| t.purchase_id == *purchase_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    async fn list_page(
        &self,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<PurchasePage, DomainError> {
        self.check_failing()?;
        let state = self.state.lock().unwrap();
        let mut matching: Vec<Purchase> = state
            .purchases
            .iter()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        Ok(PurchasePage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use crate::domain::purchase::Actor;
    use serde_json::json;

    fn purchase_for(user_id: UserId, trip_id: TripId) -> Purchase {
        Purchase::create(PurchaseId::new(), user_id, trip_id, Money::from_cents(1550))
    }

    fn created_entry(purchase: &Purchase) -> TransactionEntry {
        TransactionEntry::created(purchase.id, Actor::User(purchase.user_id), json!({}))
    }

    #[tokio::test]
    async fn insert_persists_purchase_and_entry() {
        let ledger = InMemoryPurchaseLedger::new();
        let purchase = purchase_for(UserId::new(), TripId::new());

        let outcome = ledger.insert(&purchase, &created_entry(&purchase)).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(ledger.purchases().len(), 1);
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_second_active_purchase() {
        let ledger = InMemoryPurchaseLedger::new();
        let user_id = UserId::new();
        let trip_id = TripId::new();
        let first = purchase_for(user_id, trip_id);
        ledger.insert(&first, &created_entry(&first)).await.unwrap();

        let second = purchase_for(user_id, trip_id);
        let outcome = ledger.insert(&second, &created_entry(&second)).await.unwrap();

        assert_eq!(outcome, InsertOutcome::DuplicateActive);
        assert_eq!(ledger.purchases().len(), 1);
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[tokio::test]
    async fn insert_allows_retry_after_failed_purchase() {
        let ledger = InMemoryPurchaseLedger::new();
        let user_id = UserId::new();
        let trip_id = TripId::new();
        let mut first = purchase_for(user_id, trip_id);
        ledger.insert(&first, &created_entry(&first)).await.unwrap();

        let expected = first.status;
        first.fail().unwrap();
        let entry = TransactionEntry::failed(first.id, Actor::System, json!({}));
        ledger.apply_transition(&first, expected, &entry).await.unwrap();

        let second = purchase_for(user_id, trip_id);
        let outcome = ledger.insert(&second, &created_entry(&second)).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);
    }

    #[tokio::test]
    async fn transition_applies_when_status_matches() {
        let ledger = InMemoryPurchaseLedger::new();
        let mut purchase = purchase_for(UserId::new(), TripId::new());
        ledger.insert(&purchase, &created_entry(&purchase)).await.unwrap();

        let expected = purchase.status;
        purchase.complete(Some("pi_1".to_string()), None).unwrap();
        let entry = TransactionEntry::completed(purchase.id, Actor::System, json!({}));

        let outcome = ledger.apply_transition(&purchase, expected, &entry).await.unwrap();

        assert_eq!(outcome, TransitionOutcome::Applied);
        let stored = ledger.find_by_id(&purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseStatus::Completed);
        assert_eq!(ledger.transactions().len(), 2);
    }

    #[tokio::test]
    async fn transition_reports_mismatch_without_writing() {
        let ledger = InMemoryPurchaseLedger::new();
        let mut purchase = purchase_for(UserId::new(), TripId::new());
        ledger.insert(&purchase, &created_entry(&purchase)).await.unwrap();

        purchase.complete(None, None).unwrap();
        let entry = TransactionEntry::completed(purchase.id, Actor::System, json!({}));
        ledger
            .apply_transition(&purchase, PurchaseStatus::Pending, &entry)
            .await
            .unwrap();

        // Second attempt sees Completed, not Pending
        let outcome = ledger
            .apply_transition(&purchase, PurchaseStatus::Pending, &entry)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::StatusMismatch(PurchaseStatus::Completed)
        );
        assert_eq!(ledger.transactions().len(), 2);
    }

    #[tokio::test]
    async fn transition_reports_not_found() {
        let ledger = InMemoryPurchaseLedger::new();
        let purchase = purchase_for(UserId::new(), TripId::new());
        let entry = created_entry(&purchase);

        let outcome = ledger
            .apply_transition(&purchase, PurchaseStatus::Pending, &entry)
            .await
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::NotFound);
    }

    #[tokio::test]
    async fn list_page_filters_by_status() {
        let ledger = InMemoryPurchaseLedger::new();
        let mut completed = purchase_for(UserId::new(), TripId::new());
        ledger.insert(&completed, &created_entry(&completed)).await.unwrap();
        let expected = completed.status;
        completed.complete(None, None).unwrap();
        let entry = TransactionEntry::completed(completed.id, Actor::System, json!({}));
        ledger.apply_transition(&completed, expected, &entry).await.unwrap();

        let pending = purchase_for(UserId::new(), TripId::new());
        ledger.insert(&pending, &created_entry(&pending)).await.unwrap();

        let filter = PurchaseFilter {
            status: Some(PurchaseStatus::Completed),
            ..Default::default()
        };
        let page = ledger.list_page(&filter, PageRequest::default()).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, completed.id);
    }

    #[tokio::test]
    async fn list_page_searches_external_payment_id() {
        let ledger = InMemoryPurchaseLedger::new();
        let mut purchase = purchase_for(UserId::new(), TripId::new());
        ledger.insert(&purchase, &created_entry(&purchase)).await.unwrap();
        let expected = purchase.status;
        purchase.complete(Some("pi_abc999".to_string()), None).unwrap();
        let entry = TransactionEntry::completed(purchase.id, Actor::System, json!({}));
        ledger.apply_transition(&purchase, expected, &entry).await.unwrap();

        let filter = PurchaseFilter {
            search: Some("abc999".to_string()),
            ..Default::default()
        };
        let page = ledger.list_page(&filter, PageRequest::default()).await.unwrap();

        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn list_page_paginates() {
        let ledger = InMemoryPurchaseLedger::new();
        for _ in 0..5 {
            let purchase = purchase_for(UserId::new(), TripId::new());
            ledger.insert(&purchase, &created_entry(&purchase)).await.unwrap();
        }

        let page = ledger
            .list_page(
                &PurchaseFilter::default(),
                PageRequest { limit: 2, offset: 4 },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn failing_mode_surfaces_database_errors() {
        let ledger = InMemoryPurchaseLedger::new();
        ledger.set_failing(true);

        let result = ledger.find_by_id(&PurchaseId::new()).await;
        assert!(result.is_err());
    }
}
