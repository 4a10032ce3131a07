//! Push the canonical catalog into the remote store.
//!
//! Every write operation:
//!
//! 1. Takes the engine's write lock (one writer at a time, callers queue).
//! 2. Generates a run id, stamped into provenance and the tracing span.
//! 3. Validates the records it is about to write.
//! 4. Commits in sequential batches of at most
//!    `min(batch_size, store.max_batch_size())` operations.
//!
//! A batch is atomic; a sequence of batches is not. When a commit fails
//! partway, the result reports how many records were committed before it.
//!
//! Operations never return `Err`: expected failures (store down, empty
//! selection, rejected batch) come back as results with `success: false`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use electroshop_core::{
    CatalogStats, Category, DataSource, Product, ProductId, Provenance, StoredProduct,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

use crate::canonical::CanonicalCatalog;
use crate::config::StoreConfig;
use crate::error::SyncError;
use crate::store::{DEFAULT_MAX_BATCH_SIZE, ProductStore, StoreQuery, WriteBatch, WriteOp};

// =============================================================================
// Options
// =============================================================================

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Upper bound on operations per batch. The store's own cap also applies.
    pub batch_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl From<&StoreConfig> for SyncOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            batch_size: config.batch_size,
        }
    }
}

/// Options for [`SyncEngine::perform_full_import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullImportOptions {
    /// Delete every remote record before importing.
    pub clear_existing: bool,
    /// Import only this category. `None` imports the whole catalog.
    pub category: Option<Category>,
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of an import or clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    /// Records written or deleted. On failure, records committed before it.
    pub count: usize,
}

impl SyncResult {
    fn ok(message: String, count: usize) -> Self {
        Self {
            success: true,
            message,
            count,
        }
    }

    fn failed(err: &SyncError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            count: err.committed(),
        }
    }
}

/// Outcome of [`SyncEngine::update_changed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub success: bool,
    pub message: String,
    /// Records that did not exist remotely and were inserted.
    pub added: usize,
    /// Existing records that were overwritten.
    pub updated: usize,
    /// Of `updated`, how many already matched the catalog field for field.
    pub unchanged: usize,
}

/// Outcome of [`SyncEngine::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub success: bool,
    pub message: String,
    /// Aggregates over every remote record. `None` when the read failed.
    pub stats: Option<CatalogStats>,
}

/// Outcome of [`SyncEngine::perform_full_import`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub success: bool,
    pub message: String,
    /// Records deleted by the clear phase.
    pub cleared: usize,
    /// Records written by the import phase.
    pub imported: usize,
    /// Verification aggregates, present when the pipeline reached that phase.
    pub stats: Option<CatalogStats>,
}

/// Counts from the update phase, before conversion to a result.
#[derive(Debug, Clone, Copy, Default)]
struct UpdateCounts {
    added: usize,
    updated: usize,
    unchanged: usize,
}

// =============================================================================
// Engine
// =============================================================================

/// Writes canonical records into a [`ProductStore`].
///
/// Share it behind an `Arc`; concurrent callers are serialized internally.
#[derive(Debug)]
pub struct SyncEngine<S> {
    store: S,
    catalog: Arc<CanonicalCatalog>,
    options: SyncOptions,
    write_lock: Mutex<()>,
}

impl<S: ProductStore> SyncEngine<S> {
    /// Create an engine over an explicit store handle.
    #[must_use]
    pub fn new(store: S, catalog: Arc<CanonicalCatalog>, options: SyncOptions) -> Self {
        Self {
            store,
            catalog,
            options,
            write_lock: Mutex::new(()),
        }
    }

    /// The store this engine writes to.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The catalog this engine reads from.
    #[must_use]
    pub fn catalog(&self) -> &CanonicalCatalog {
        &self.catalog
    }

    /// Operations per committed batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.options
            .batch_size
            .min(self.store.max_batch_size())
            .max(1)
    }

    /// Upsert every canonical record, optionally clearing the store first.
    ///
    /// If the clear step fails the import is not attempted, and `count`
    /// holds the deletions committed before the failure.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn full_import(&self, clear_existing: bool) -> SyncResult {
        let _guard = self.acquire().await;
        let run_id = start_run();

        if clear_existing && let Err(e) = self.clear_locked().await {
            let deleted = e.committed();
            warn!(error = %e, deleted, "Clear failed, full import aborted");
            return SyncResult {
                success: false,
                message: format!("Clear failed after deleting {deleted} products, import aborted: {e}"),
                count: deleted,
            };
        }

        let products: Vec<&Product> = self.catalog.all().iter().collect();
        match self
            .import_locked(&products, DataSource::StaticImport, run_id)
            .await
        {
            Ok(count) => {
                info!(count, "Full import complete");
                SyncResult::ok(format!("Imported {count} products"), count)
            }
            Err(e) => {
                warn!(error = %e, "Full import failed");
                SyncResult::failed(&e)
            }
        }
    }

    /// Upsert the canonical records of one category.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn import_by_category(&self, category: Category) -> SyncResult {
        let _guard = self.acquire().await;
        let run_id = start_run();

        match self.import_category_locked(category, run_id).await {
            Ok(count) => {
                info!(count, %category, "Category import complete");
                SyncResult::ok(format!("Imported {count} products in '{category}'"), count)
            }
            Err(e) => {
                warn!(error = %e, %category, "Category import failed");
                SyncResult::failed(&e)
            }
        }
    }

    /// Insert canonical records missing from the store and overwrite the rest.
    ///
    /// Overwrites are unconditional; `unchanged` in the result only reports
    /// how many of them were already identical.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn update_changed(&self) -> UpdateResult {
        let _guard = self.acquire().await;
        let run_id = start_run();

        match self.update_locked(run_id).await {
            Ok(counts) => {
                info!(
                    added = counts.added,
                    updated = counts.updated,
                    unchanged = counts.unchanged,
                    "Update complete"
                );
                UpdateResult {
                    success: true,
                    message: format!(
                        "Added {} and updated {} products ({} unchanged)",
                        counts.added, counts.updated, counts.unchanged
                    ),
                    added: counts.added,
                    updated: counts.updated,
                    unchanged: counts.unchanged,
                }
            }
            Err((e, partial)) => {
                warn!(error = %e, "Update failed");
                UpdateResult {
                    success: false,
                    message: e.to_string(),
                    added: partial.added,
                    updated: partial.updated,
                    unchanged: partial.unchanged,
                }
            }
        }
    }

    /// Delete every remote record. Succeeds with count 0 on an empty store.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn clear_all(&self) -> SyncResult {
        let _guard = self.acquire().await;
        start_run();

        match self.clear_locked().await {
            Ok(count) => {
                info!(count, "Clear complete");
                SyncResult::ok(format!("Deleted {count} products"), count)
            }
            Err(e) => {
                warn!(error = %e, "Clear failed");
                SyncResult::failed(&e)
            }
        }
    }

    /// Aggregate every remote record.
    ///
    /// Read-only, so it does not wait for in-flight writers.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> VerifyResult {
        match self.read_stats().await {
            Ok(stats) => VerifyResult {
                success: true,
                message: format!("Remote store holds {} products", stats.total),
                stats: Some(stats),
            },
            Err(e) => {
                warn!(error = %e, "Verify failed");
                VerifyResult {
                    success: false,
                    message: e.to_string(),
                    stats: None,
                }
            }
        }
    }

    /// Clear (optional), import (full or one category), then verify.
    ///
    /// `on_progress` is called before each phase, and with `"Done"` only
    /// when every phase succeeded. The first failing phase stops the pipeline; completed phases are not rolled back. Re-running
    /// the pipeline heals a store left empty by an interrupted run.
    #[instrument(skip(self, on_progress), fields(run_id = tracing::field::Empty))]
    pub async fn perform_full_import<F>(
        &self,
        options: FullImportOptions,
        mut on_progress: F,
    ) -> PipelineResult
    where
        F: FnMut(&str) + Send,
    {
        let _guard = self.acquire().await;
        let run_id = start_run();

        let mut result = PipelineResult {
            success: false,
            message: String::new(),
            cleared: 0,
            imported: 0,
            stats: None,
        };

        if options.clear_existing {
            on_progress("Clearing remote store");
            match self.clear_locked().await {
                Ok(count) => result.cleared = count,
                Err(e) => {
                    warn!(error = %e, "Pipeline aborted in clear phase");
                    result.cleared = e.committed();
                    result.message = format!("Clear failed: {e}");
                    return result;
                }
            }
        }

        let imported = match options.category {
            Some(category) => {
                on_progress(&format!("Importing category '{category}'"));
                self.import_category_locked(category, run_id).await
            }
            None => {
                on_progress("Importing full catalog");
                let products: Vec<&Product> = self.catalog.all().iter().collect();
                self.import_locked(&products, DataSource::StaticImport, run_id)
                    .await
            }
        };
        match imported {
            Ok(count) => result.imported = count,
            Err(e) => {
                warn!(error = %e, "Pipeline aborted in import phase");
                result.imported = e.committed();
                result.message = format!("Import failed: {e}");
                return result;
            }
        }

        on_progress("Verifying remote store");
        match self.read_stats().await {
            Ok(stats) if stats.total < result.imported => {
                result.message = format!(
                    "Verification found {} products, expected at least {}",
                    stats.total, result.imported
                );
                result.stats = Some(stats);
            }
            Ok(stats) => {
                result.success = true;
                result.message = format!(
                    "Imported {} products, remote store holds {}",
                    result.imported, stats.total
                );
                result.stats = Some(stats);
            }
            Err(e) => {
                result.message = format!("Verification failed: {e}");
            }
        }

        if result.success {
            on_progress("Done");
        }
        info!(
            success = result.success,
            cleared = result.cleared,
            imported = result.imported,
            "Pipeline finished"
        );
        result
    }

    // -------------------------------------------------------------------------
    // Phases (caller holds the write lock)
    // -------------------------------------------------------------------------

    async fn acquire(&self) -> tokio::sync::MutexGuard<'_, ()> {
        if let Ok(guard) = self.write_lock.try_lock() {
            return guard;
        }
        debug!("Waiting for in-flight sync operation");
        self.write_lock.lock().await
    }

    async fn clear_locked(&self) -> Result<usize, SyncError> {
        let ids = self.store.list_ids().await.map_err(SyncError::from_store)?;
        if ids.is_empty() {
            return Ok(0);
        }
        let ops = ids.into_iter().map(WriteOp::Delete).collect();
        self.commit_all(ops).await
    }

    async fn import_category_locked(
        &self,
        category: Category,
        run_id: Uuid,
    ) -> Result<usize, SyncError> {
        let products = self.catalog.by_category(category);
        if products.is_empty() {
            return Err(SyncError::EmptySelection(category));
        }
        self.import_locked(&products, DataSource::CategoryImport(category), run_id)
            .await
    }

    async fn import_locked(
        &self,
        products: &[&Product],
        source: DataSource,
        run_id: Uuid,
    ) -> Result<usize, SyncError> {
        for product in products {
            product.validate()?;
        }

        let now = Utc::now();
        let ops = products
            .iter()
            .map(|p| {
                let provenance = Provenance::imported(source, now, run_id);
                WriteOp::Upsert(Box::new(StoredProduct::new((*p).clone(), provenance)))
            })
            .collect();
        self.commit_all(ops).await
    }

    async fn update_locked(
        &self,
        run_id: Uuid,
    ) -> Result<UpdateCounts, (SyncError, UpdateCounts)> {
        let products = self.catalog.all();
        for product in products {
            product
                .validate()
                .map_err(|e| (SyncError::from(e), UpdateCounts::default()))?;
        }

        let ids: Vec<ProductId> = products.iter().map(|p| p.id.clone()).collect();
        let existing: HashMap<ProductId, StoredProduct> = self
            .store
            .get_many(&ids)
            .await
            .map_err(|e| (SyncError::from_store(e), UpdateCounts::default()))?
            .into_iter()
            .map(|doc| (doc.product.id.clone(), doc))
            .collect();

        let now = Utc::now();
        let mut ops = Vec::with_capacity(products.len());
        // Per operation: (inserted, already identical).
        let mut kinds = Vec::with_capacity(products.len());
        for product in products {
            let mut fresh = product.clone();
            fresh.updated_at = now;
            let doc = if let Some(current) = existing.get(&product.id) {
                kinds.push((false, current.product.same_content(product)));
                let provenance = Provenance {
                    last_modified: Some(now),
                    sync_run_id: Some(run_id),
                    ..current.provenance.clone()
                };
                StoredProduct::new(fresh, provenance)
            } else {
                kinds.push((true, false));
                fresh.created_at = now;
                StoredProduct::new(fresh, Provenance::modified(now, run_id))
            };
            ops.push(WriteOp::Upsert(Box::new(doc)));
        }

        // Committed batches are a prefix of `ops`.
        let tally = |n: usize| {
            kinds
                .iter()
                .take(n)
                .fold(UpdateCounts::default(), |mut c, &(inserted, identical)| {
                    if inserted {
                        c.added += 1;
                    } else {
                        c.updated += 1;
                        c.unchanged += usize::from(identical);
                    }
                    c
                })
        };

        match self.commit_all(ops).await {
            Ok(n) => Ok(tally(n)),
            Err(e) => {
                let partial = tally(e.committed());
                Err((e, partial))
            }
        }
    }

    /// Commit `ops` in sequential bounded batches.
    async fn commit_all(&self, ops: Vec<WriteOp>) -> Result<usize, SyncError> {
        let batch_size = self.batch_size();
        let total = ops.len();
        let mut committed = 0;
        let mut ops = ops.into_iter().peekable();

        while ops.peek().is_some() {
            let batch: WriteBatch = ops.by_ref().take(batch_size).collect();
            let size = batch.len();
            match self.store.commit(batch).await {
                Ok(applied) => {
                    committed += applied;
                    debug!(size, committed, total, "Batch committed");
                }
                Err(source) if committed == 0 && source.is_configuration() => {
                    return Err(SyncError::Configuration(source));
                }
                Err(source) => {
                    if committed > 0 {
                        warn!(committed, total, error = %source, "Batch failed after partial progress");
                    }
                    return Err(SyncError::Write { committed, source });
                }
            }
        }

        Ok(committed)
    }

    async fn read_stats(&self) -> Result<CatalogStats, SyncError> {
        let documents = self
            .store
            .query(&StoreQuery::all())
            .await
            .map_err(SyncError::from_store)?;
        Ok(CatalogStats::from_products(
            documents.iter().map(|d| &d.product),
        ))
    }
}

/// New run id, recorded on the current span.
fn start_run() -> Uuid {
    let run_id = Uuid::new_v4();
    Span::current().record("run_id", tracing::field::display(run_id));
    run_id
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn catalog() -> Arc<CanonicalCatalog> {
        Arc::new(CanonicalCatalog::load_embedded().unwrap())
    }

    fn engine(store: &MemoryStore, batch_size: usize) -> SyncEngine<MemoryStore> {
        SyncEngine::new(store.clone(), catalog(), SyncOptions { batch_size })
    }

    #[tokio::test]
    async fn test_full_import_then_verify() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);

        let result = engine.full_import(true).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.count, engine.catalog().len());

        let verified = engine.verify().await;
        assert!(verified.success);
        assert_eq!(verified.stats.unwrap().total, engine.catalog().len());
    }

    #[tokio::test]
    async fn test_import_stamps_provenance() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        engine.import_by_category(Category::Solaire).await;

        let doc = store.snapshot().into_iter().next().unwrap();
        assert_eq!(
            doc.provenance.data_source,
            Some(DataSource::CategoryImport(Category::Solaire))
        );
        assert!(doc.provenance.imported_at.is_some());
        assert!(doc.provenance.sync_run_id.is_some());
        assert_eq!(
            engine.catalog().get(&doc.product.id),
            Some(&doc.product)
        );
    }

    #[tokio::test]
    async fn test_writes_split_into_bounded_batches() {
        let store = MemoryStore::new();
        let engine = engine(&store, 4);
        let total = engine.catalog().len();

        let result = engine.full_import(false).await;
        assert!(result.success);
        assert_eq!(store.commit_count(), total.div_ceil(4));
    }

    #[tokio::test]
    async fn test_store_cap_bounds_batch_size() {
        let store = MemoryStore::with_max_batch_size(5);
        let engine = engine(&store, 500);
        assert_eq!(engine.batch_size(), 5);

        assert!(engine.full_import(false).await.success);
        assert_eq!(store.len(), engine.catalog().len());
    }

    #[tokio::test]
    async fn test_partial_failure_reports_committed_records() {
        let store = MemoryStore::new();
        let engine = engine(&store, 4);
        store.fail_after_commits(2);

        let result = engine.full_import(false).await;
        assert!(!result.success);
        assert_eq!(result.count, 8);
        assert_eq!(store.len(), 8);
        assert!(result.message.contains("after 8 committed"));
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails_without_panicking() {
        let store = MemoryStore::unconfigured();
        let engine = engine(&store, 500);

        let result = engine.full_import(false).await;
        assert!(!result.success);
        assert_eq!(result.count, 0);
        assert!(result.message.contains("not configured"));

        assert!(!engine.verify().await.success);
    }

    #[tokio::test]
    async fn test_failed_clear_aborts_import() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        store.set_available(false);

        let result = engine.full_import(true).await;
        assert!(!result.success);
        assert!(result.message.starts_with("Clear failed"));

        store.set_available(true);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_partial_clear_reports_deleted_records() {
        let store = MemoryStore::new();
        let engine = engine(&store, 4);
        let total = engine.catalog().len();
        assert!(engine.full_import(false).await.success);
        store.fail_after_commits(1);

        let result = engine.full_import(true).await;
        assert!(!result.success);
        assert_eq!(result.count, 4);
        assert!(result.message.contains("after deleting 4 products"));
        assert_eq!(store.len(), total - 4);
    }

    #[tokio::test]
    async fn test_empty_category_selection() {
        let embedded = CanonicalCatalog::load_embedded().unwrap();
        let cameras_only = CanonicalCatalog::from_products(
            embedded
                .by_category(Category::Cameras)
                .into_iter()
                .cloned()
                .collect(),
        )
        .unwrap();
        let store = MemoryStore::new();
        let engine = SyncEngine::new(
            store.clone(),
            Arc::new(cameras_only),
            SyncOptions::default(),
        );

        let result = engine.import_by_category(Category::Pc).await;
        assert!(!result.success);
        assert_eq!(result.count, 0);
        assert!(result.message.contains("'pc'"));
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_update_changed_adds_then_overwrites() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        let total = engine.catalog().len();

        let first = engine.update_changed().await;
        assert!(first.success);
        assert_eq!((first.added, first.updated), (total, 0));

        let second = engine.update_changed().await;
        assert!(second.success);
        assert_eq!((second.added, second.updated), (0, total));
        assert_eq!(second.unchanged, total);
        assert_eq!(store.len(), total);
    }

    #[tokio::test]
    async fn test_update_keeps_import_provenance() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        engine.full_import(false).await;
        engine.update_changed().await;

        let id = ProductId::parse("hik-001").unwrap();
        let doc = store.document(&id).unwrap();
        assert_eq!(doc.provenance.data_source, Some(DataSource::StaticImport));
        assert!(doc.provenance.imported_at.is_some());
        assert!(doc.provenance.last_modified.is_some());
        // Overwrite keeps the catalog creation time.
        assert_eq!(
            doc.product.created_at,
            engine.catalog().get(&id).unwrap().created_at
        );
    }

    #[tokio::test]
    async fn test_update_counts_partial_progress() {
        let store = MemoryStore::new();
        let engine = engine(&store, 5);
        store.fail_after_commits(1);

        let result = engine.update_changed().await;
        assert!(!result.success);
        assert_eq!(result.added + result.updated, 5);
    }

    #[tokio::test]
    async fn test_clear_all_is_idempotent() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        engine.full_import(false).await;

        let first = engine.clear_all().await;
        assert!(first.success);
        assert_eq!(first.count, engine.catalog().len());

        let second = engine.clear_all().await;
        assert!(second.success);
        assert_eq!(second.count, 0);
    }

    #[tokio::test]
    async fn test_pipeline_reports_phases() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        engine.full_import(false).await;

        let mut phases = Vec::new();
        let result = engine
            .perform_full_import(
                FullImportOptions {
                    clear_existing: true,
                    category: Some(Category::Cameras),
                },
                |msg| phases.push(msg.to_owned()),
            )
            .await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.cleared, engine.catalog().len());
        let cameras = engine.catalog().by_category(Category::Cameras).len();
        assert_eq!(result.imported, cameras);
        assert_eq!(result.stats.unwrap().total, cameras);
        assert_eq!(
            phases,
            [
                "Clearing remote store",
                "Importing category 'cameras'",
                "Verifying remote store",
                "Done",
            ]
        );
    }

    #[tokio::test]
    async fn test_pipeline_stops_at_failed_phase() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        store.fail_after_commits(0);

        let mut phases = Vec::new();
        let result = engine
            .perform_full_import(FullImportOptions::default(), |msg| {
                phases.push(msg.to_owned());
            })
            .await;

        assert!(!result.success);
        assert!(result.message.starts_with("Import failed"));
        assert!(result.stats.is_none());
        assert_eq!(phases, ["Importing full catalog"]);
    }

    #[tokio::test]
    async fn test_pipeline_failed_verification_is_not_done() {
        let store = MemoryStore::new();
        let engine = engine(&store, 500);
        let remote = store.clone();

        let mut phases = Vec::new();
        let result = engine
            .perform_full_import(FullImportOptions::default(), |msg| {
                if msg == "Verifying remote store" {
                    remote.set_available(false);
                }
                phases.push(msg.to_owned());
            })
            .await;

        assert!(!result.success);
        assert!(result.message.starts_with("Verification failed"));
        assert_eq!(result.imported, engine.catalog().len());
        assert_eq!(phases, ["Importing full catalog", "Verifying remote store"]);
    }
}
