//! PostgreSQL implementation of the TripCatalog port.
//!
//! Read-only view over the platform's `trips` table. That table is
//! owned by the catalog service; no migration for it lives here.

use crate::domain::foundation::{DomainError, Money, TripId, UserId};
use crate::ports::{TripCatalog, TripSnapshot};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed trip catalog.
pub struct PostgresTripCatalog {
    pool: PgPool,
}

impl PostgresTripCatalog {
    /// Creates a catalog backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    owner_id: Uuid,
    price_cents: i64,
    published: bool,
}

#[async_trait]
impl TripCatalog for PostgresTripCatalog {
    async fn find_trip(&self, trip_id: &TripId) -> Result<Option<TripSnapshot>, DomainError> {
        let row: Option<TripRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, price_cents, published
            FROM trips
            WHERE id = $1
            "#,
        )
        .bind(trip_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find trip: {}", e)))?;

        Ok(row.map(|row| TripSnapshot {
            id: TripId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            price: Money::from_cents(row.price_cents),
            published: row.published,
        }))
    }
}
