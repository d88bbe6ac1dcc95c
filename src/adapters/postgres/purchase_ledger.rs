//! PostgreSQL implementation of the PurchaseLedger port.
//!
//! Purchases live in the `purchases` table, their audit log in
//! `purchase_transactions`. The one-active-purchase-per-(user, trip)
//! rule is enforced by the partial unique index
//! `purchases_active_user_trip_idx`, and every state transition runs as
//! a single transaction that updates the row and appends its log entry.

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PurchaseId, Timestamp, TransactionId, TripId, UserId,
};
use crate::domain::purchase::{
    Actor, Purchase, PurchaseStatus, TransactionEntry, TransactionEventType,
};
use crate::ports::{
    InsertOutcome, PageRequest, PurchaseFilter, PurchaseLedger, PurchasePage, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Name of the partial unique index guarding active purchases.
const ACTIVE_PURCHASE_INDEX: &str = "purchases_active_user_trip_idx";

/// PostgreSQL-backed purchase ledger.
pub struct PostgresPurchaseLedger {
    pool: PgPool,
}

impl PostgresPurchaseLedger {
    /// Creates a ledger backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    user_id: Uuid,
    trip_id: Uuid,
    amount_cents: i64,
    status: String,
    payment_method: Option<String>,
    external_payment_id: Option<String>,
    purchased_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let status = PurchaseStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;

        Ok(Purchase {
            id: PurchaseId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            trip_id: TripId::from_uuid(row.trip_id),
            amount: Money::from_cents(row.amount_cents),
            status,
            payment_method: row.payment_method,
            external_payment_id: row.external_payment_id,
            purchased_at: row.purchased_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Database row representation of an audit log entry.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    purchase_id: Uuid,
    event_type: String,
    actor: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionEntry {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let event_type = TransactionEventType::parse(&row.event_type).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid event type value: {}", row.event_type),
            )
        })?;
        let actor = Actor::parse(&row.actor).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid actor value: {}", row.actor),
            )
        })?;

        Ok(TransactionEntry {
            id: TransactionId::from_uuid(row.id),
            purchase_id: PurchaseId::from_uuid(row.purchase_id),
            event_type,
            actor,
            metadata: row.metadata,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn storage_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

async fn append_entry<'e, E>(executor: E, entry: &TransactionEntry) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO purchase_transactions (id, purchase_id, event_type, actor, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.purchase_id.as_uuid())
    .bind(entry.event_type.as_str())
    .bind(entry.actor.as_str())
    .bind(&entry.metadata)
    .bind(entry.created_at.as_datetime())
    .execute(executor)
    .await
    .map(|_| ())
}

#[async_trait]
impl PurchaseLedger for PostgresPurchaseLedger {
    async fn insert(
        &self,
        purchase: &Purchase,
        entry: &TransactionEntry,
    ) -> Result<InsertOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        let insert = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, trip_id, amount_cents, status, payment_method,
                external_payment_id, purchased_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.user_id.as_uuid())
        .bind(purchase.trip_id.as_uuid())
        .bind(purchase.amount.cents())
        .bind(purchase.status.as_str())
        .bind(&purchase.payment_method)
        .bind(&purchase.external_payment_id)
        .bind(purchase.purchased_at.as_ref().map(|t| *t.as_datetime()))
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.updated_at.as_datetime())
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(ACTIVE_PURCHASE_INDEX) {
                    tx.rollback()
                        .await
                        .map_err(|e| storage_error("Failed to roll back transaction", e))?;
                    return Ok(InsertOutcome::DuplicateActive);
                }
            }
            return Err(storage_error("Failed to insert purchase", e));
        }

        append_entry(&mut *tx, entry)
            .await
            .map_err(|e| storage_error("Failed to append transaction entry", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit transaction", e))?;

        Ok(InsertOutcome::Inserted)
    }

    async fn apply_transition(
        &self,
        purchase: &Purchase,
        expected_status: PurchaseStatus,
        entry: &TransactionEntry,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                status = $3,
                payment_method = $4,
                external_payment_id = $5,
                purchased_at = $6,
                updated_at = $7
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(expected_status.as_str())
        .bind(purchase.status.as_str())
        .bind(&purchase.payment_method)
        .bind(&purchase.external_payment_id)
        .bind(purchase.purchased_at.as_ref().map(|t| *t.as_datetime()))
        .bind(purchase.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error("Failed to update purchase", e))?;

        if result.rows_affected() == 0 {
            // Row missing or status moved; look again to tell which.
            let actual: Option<String> =
                sqlx::query_scalar("SELECT status FROM purchases WHERE id = $1")
                    .bind(purchase.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| storage_error("Failed to read purchase status", e))?;

            tx.rollback()
                .await
                .map_err(|e| storage_error("Failed to roll back transaction", e))?;

            return match actual {
                Some(raw) => {
                    let status = PurchaseStatus::parse(&raw).ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::DatabaseError,
                            format!("Invalid status value: {}", raw),
                        )
                    })?;
                    Ok(TransitionOutcome::StatusMismatch(status))
                }
                None => Ok(TransitionOutcome::NotFound),
            };
        }

        append_entry(&mut *tx, entry)
            .await
            .map_err(|e| storage_error("Failed to append transaction entry", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit transaction", e))?;

        Ok(TransitionOutcome::Applied)
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, trip_id, amount_cents, status, payment_method,
                   external_payment_id, purchased_at, created_at, updated_at
            FROM purchases
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to find purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, trip_id, amount_cents, status, payment_method,
                   external_payment_id, purchased_at, created_at, updated_at
            FROM purchases
            WHERE user_id = $1 AND trip_id = $2 AND status IN ('pending', 'completed')
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(trip_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to find active purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, trip_id, amount_cents, status, payment_method,
                   external_payment_id, purchased_at, created_at, updated_at
            FROM purchases
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list purchases", e))?;

        rows.into_iter().map(Purchase::try_from).collect()
    }

    async fn list_transactions(
        &self,
        purchase_id: &PurchaseId,
    ) -> Result<Vec<TransactionEntry>, DomainError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, purchase_id, event_type, actor, metadata, created_at
            FROM purchase_transactions
            WHERE purchase_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(purchase_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list transaction entries", e))?;

        rows.into_iter().map(TransactionEntry::try_from).collect()
    }

    async fn list_page(
        &self,
        filter: &PurchaseFilter,
        page: PageRequest,
    ) -> Result<PurchasePage, DomainError> {
        let (where_clause, binds) = build_filter_clause(filter);

        let count_sql = format!("SELECT COUNT(*) FROM purchases{}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count_query = bind_filter_value(count_query, bind);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to count purchases", e))?;

        let list_sql = format!(
            r#"
            SELECT id, user_id, trip_id, amount_cents, status, payment_method,
                   external_payment_id, purchased_at, created_at, updated_at
            FROM purchases{}
            ORDER BY created_at DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            binds.len() + 1,
            binds.len() + 2,
        );
        let mut list_query = sqlx::query_as::<_, PurchaseRow>(&list_sql);
        for bind in &binds {
            list_query = bind_filter_row_value(list_query, bind);
        }
        let rows = list_query
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to list purchases", e))?;

        let items = rows
            .into_iter()
            .map(Purchase::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PurchasePage {
            items,
            total: total.max(0) as u64,
        })
    }
}

/// A single bound value in a dynamically built filter.
enum FilterBind {
    Uuid(Uuid),
    Text(String),
}

/// Builds the WHERE clause for admin listings, returning the clause text
/// and the values to bind in order ($1, $2, ...).
fn build_filter_clause(filter: &PurchaseFilter) -> (String, Vec<FilterBind>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = filter.status {
        binds.push(FilterBind::Text(status.as_str().to_string()));
        conditions.push(format!("status = ${}", binds.len()));
    }
    if let Some(user_id) = filter.user_id {
        binds.push(FilterBind::Uuid(*user_id.as_uuid()));
        conditions.push(format!("user_id = ${}", binds.len()));
    }
    if let Some(trip_id) = filter.trip_id {
        binds.push(FilterBind::Uuid(*trip_id.as_uuid()));
        conditions.push(format!("trip_id = ${}", binds.len()));
    }
    if let Some(search) = &filter.search {
        binds.push(FilterBind::Text(format!("%{}%", search.to_lowercase())));
        let n = binds.len();
        conditions.push(format!(
            "(id::text LIKE ${n} OR LOWER(COALESCE(external_payment_id, '')) LIKE ${n} OR LOWER(COALESCE(payment_method, '')) LIKE ${n})"
        ));
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

type ScalarQuery<'q> = sqlx::query::QueryScalar<
    'q,
    sqlx::Postgres,
    i64,
    sqlx::postgres::PgArguments,
>;

fn bind_filter_value<'q>(query: ScalarQuery<'q>, bind: &'q FilterBind) -> ScalarQuery<'q> {
    match bind {
        FilterBind::Uuid(v) => query.bind(*v),
        FilterBind::Text(v) => query.bind(v.as_str()),
    }
}

type RowQuery<'q> = sqlx::query::QueryAs<
    'q,
    sqlx::Postgres,
    PurchaseRow,
    sqlx::postgres::PgArguments,
>;

fn bind_filter_row_value<'q>(query: RowQuery<'q>, bind: &'q FilterBind) -> RowQuery<'q> {
    match bind {
        FilterBind::Uuid(v) => query.bind(*v),
        FilterBind::Text(v) => query.bind(v.as_str()),
    }
}
