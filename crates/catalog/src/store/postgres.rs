//! `PostgreSQL`-backed product store.
//!
//! # Table: `catalog.product`
//!
//! One row per product. The full document (product fields plus provenance)
//! lives in the `document` JSONB column; `category`, `is_active`,
//! `is_featured` and `created_at` are copied into plain columns so filters and
//! ordering use indexes.
//!
//! # Migrations
//!
//! Stored in `crates/catalog/migrations/` and run via:
//! ```bash
//! cargo run -p electroshop-cli -- migrate
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use electroshop_core::{ProductId, StoredProduct};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::{
    DEFAULT_MAX_BATCH_SIZE, Order, ProductStore, StoreError, StoreQuery, WriteBatch, WriteOp,
};
use crate::config::StoreConfig;

/// Internal row type for document reads.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    document: serde_json::Value,
}

/// Product store over a `PostgreSQL` pool.
///
/// Built without a pool when no database URL is configured; every call then
/// fails with [`StoreError::NotConfigured`] and readers fall back to the
/// canonical catalog.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: Option<PgPool>,
}

impl PgProductStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool: Some(pool) }
    }

    /// A store with no connection settings.
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self { pool: None }
    }

    /// Build a store from configuration.
    ///
    /// The pool connects lazily, so an unreachable server does not fail
    /// startup; the first read reports it and the caller falls back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection URL is malformed.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let Some(url) = config.database_url.as_ref() else {
            return Ok(Self::unconfigured());
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(url.expose_secret())?;

        Ok(Self::new(pool))
    }

    /// Whether a pool is present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotConfigured` without a pool, or the migration error.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let pool = self.pool()?;
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        Ok(())
    }

    fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool.as_ref().ok_or(StoreError::NotConfigured)
    }
}

/// Decode JSONB documents, naming the row on failure.
fn decode_rows(rows: Vec<DocumentRow>) -> Result<Vec<StoredProduct>, StoreError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row.document)
                .map_err(|source| StoreError::Document { id: row.id, source })
        })
        .collect()
}

fn push_upsert(builder: &mut QueryBuilder<'_, Postgres>, doc: &StoredProduct) {
    let created_at: DateTime<Utc> = doc.product.created_at;
    builder
        .push(
            "INSERT INTO catalog.product \
             (id, category, is_active, is_featured, created_at, document, written_at) VALUES (",
        )
        .push_bind(doc.product.id.as_str().to_owned())
        .push(", ")
        .push_bind(doc.product.category.as_str())
        .push(", ")
        .push_bind(doc.product.is_active)
        .push(", ")
        .push_bind(doc.product.is_featured)
        .push(", ")
        .push_bind(created_at)
        .push(", ")
        .push_bind(Json(doc.clone()))
        .push(
            ", NOW()) ON CONFLICT (id) DO UPDATE SET \
             category = EXCLUDED.category, \
             is_active = EXCLUDED.is_active, \
             is_featured = EXCLUDED.is_featured, \
             created_at = EXCLUDED.created_at, \
             document = EXCLUDED.document, \
             written_at = EXCLUDED.written_at",
        );
}

/// Filtered `SELECT` for a store query. Ids sort bytewise regardless of
/// the database collation.
fn select_query(query: &StoreQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<'static, Postgres> =
        QueryBuilder::new("SELECT id, document FROM catalog.product WHERE TRUE");
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(active) = query.is_active {
        builder.push(" AND is_active = ").push_bind(active);
    }
    if let Some(featured) = query.is_featured {
        builder.push(" AND is_featured = ").push_bind(featured);
    }
    match query.order {
        Order::CreatedAtDesc => {
            builder.push(r#" ORDER BY created_at DESC, id COLLATE "C" ASC"#)
        }
        Order::IdAsc => builder.push(r#" ORDER BY id COLLATE "C" ASC"#),
    };
    if let Some(limit) = query.limit {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        builder.push(" LIMIT ").push_bind(limit);
    }
    builder
}

impl ProductStore for PgProductStore {
    #[instrument(skip(self))]
    async fn query(&self, query: &StoreQuery) -> Result<Vec<StoredProduct>, StoreError> {
        let pool = self.pool()?;

        let mut builder = select_query(query);
        let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(pool).await?;
        debug!(rows = rows.len(), "Fetched product documents");
        decode_rows(rows)
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<StoredProduct>, StoreError> {
        let pool = self.pool()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, document
            FROM catalog.product
            WHERE id = ANY($1)
            ORDER BY id COLLATE "C" ASC
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        decode_rows(rows)
    }

    async fn list_ids(&self) -> Result<Vec<ProductId>, StoreError> {
        let pool = self.pool()?;

        let ids = sqlx::query_scalar::<_, ProductId>(
            r#"SELECT id FROM catalog.product ORDER BY id COLLATE "C" ASC"#,
        )
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let pool = self.pool()?;
        if batch.len() > DEFAULT_MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                max: DEFAULT_MAX_BATCH_SIZE,
            });
        }

        let mut tx = pool.begin().await?;
        let applied = batch.len();

        for op in batch.ops() {
            match op {
                WriteOp::Upsert(doc) => {
                    let mut builder = QueryBuilder::new("");
                    push_upsert(&mut builder, doc);
                    builder
                        .build()
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| StoreError::Write(e.to_string()))?;
                }
                WriteOp::Delete(id) => {
                    sqlx::query("DELETE FROM catalog.product WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| StoreError::Write(e.to_string()))?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        debug!(applied, "Committed batch");
        Ok(applied)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let pool = self.pool()?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_store_reports_configuration_error() {
        let store = PgProductStore::unconfigured();
        assert!(!store.is_configured());

        let err = store.query(&StoreQuery::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured));
        assert!(err.is_configuration());
        assert!(matches!(
            store.commit(WriteBatch::new()).await,
            Err(StoreError::NotConfigured)
        ));
    }

    #[test]
    fn test_select_orders_ids_bytewise() {
        let by_id = select_query(&StoreQuery::all());
        assert!(by_id.sql().ends_with(r#"ORDER BY id COLLATE "C" ASC"#));

        let recent = select_query(&StoreQuery {
            is_active: Some(true),
            order: Order::CreatedAtDesc,
            limit: Some(3),
            ..StoreQuery::default()
        });
        assert!(
            recent
                .sql()
                .contains(r#"ORDER BY created_at DESC, id COLLATE "C" ASC LIMIT "#)
        );
    }

    #[test]
    fn test_from_config_without_url_is_unconfigured() {
        let store = PgProductStore::from_config(&StoreConfig::default());
        assert!(matches!(store, Ok(ref s) if !s.is_configured()));
    }
}
