//! ListPurchasesHandler - Admin query over the purchase ledger.

use std::sync::Arc;

use crate::ports::{PageRequest, PurchaseFilter, PurchaseLedger, PurchasePage};

/// Largest page an admin listing will return.
const MAX_PAGE_SIZE: u32 = 200;

/// Query for the back-office purchase listing.
#[derive(Debug, Clone, Default)]
pub struct ListPurchasesQuery {
    pub filter: PurchaseFilter,
    pub page: Option<PageRequest>,
}

/// Handler for the admin purchase listing.
///
/// This read supports dashboards and support tooling, so a storage
/// failure degrades to an empty page instead of an error; the failure
/// is logged for operators. Writes never degrade this way.
pub struct ListPurchasesHandler {
    ledger: Arc<dyn PurchaseLedger>,
}

impl ListPurchasesHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, query: ListPurchasesQuery) -> PurchasePage {
        let mut page = query.page.unwrap_or_default();
        page.limit = page.limit.min(MAX_PAGE_SIZE);

        match self.ledger.list_page(&query.filter, page).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(error = %err, "purchase listing failed, returning empty page");
                PurchasePage::empty()
            }
        }
    }
}
