//! PurchaseHistoryHandler - Query for a user's own purchases.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::purchase::{Purchase, PurchaseError};
use crate::ports::PurchaseLedger;

/// Query for the caller's purchase history.
#[derive(Debug, Clone)]
pub struct PurchaseHistoryQuery {
    pub user_id: UserId,
}

/// Handler returning a user's purchases, most recent first.
///
/// Unlike the admin listing this is a user-facing read on the request
/// path, so storage failures propagate as errors.
pub struct PurchaseHistoryHandler {
    ledger: Arc<dyn PurchaseLedger>,
}

impl PurchaseHistoryHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        query: PurchaseHistoryQuery,
    ) -> Result<Vec<Purchase>, PurchaseError> {
        Ok(self.ledger.list_by_user(&query.user_id).await?)
    }
}
