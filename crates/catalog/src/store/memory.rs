//! In-process product store.
//!
//! Behaves like the remote store (atomic batches, batch cap, same query
//! semantics) and can simulate outages, a missing configuration, and a commit
//! failure partway through a multi-batch write. Used as the test double for
//! the engine and the gateway.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use electroshop_core::{ProductId, StoredProduct};
use tracing::debug;

use super::{DEFAULT_MAX_BATCH_SIZE, ProductStore, StoreError, StoreQuery, WriteBatch, WriteOp};

#[derive(Debug, Clone, Copy)]
struct Health {
    configured: bool,
    available: bool,
    /// Commits still allowed to succeed before every commit fails.
    commits_before_failure: Option<usize>,
}

#[derive(Debug)]
struct Inner {
    documents: Mutex<BTreeMap<ProductId, StoredProduct>>,
    health: Mutex<Health>,
    commits: AtomicUsize,
    max_batch_size: usize,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty, reachable store with the default batch cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_batch_size(DEFAULT_MAX_BATCH_SIZE)
    }

    /// Empty store with a custom batch cap.
    #[must_use]
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                documents: Mutex::new(BTreeMap::new()),
                health: Mutex::new(Health {
                    configured: true,
                    available: true,
                    commits_before_failure: None,
                }),
                commits: AtomicUsize::new(0),
                max_batch_size,
            }),
        }
    }

    /// Store that reports itself as not configured on every call.
    #[must_use]
    pub fn unconfigured() -> Self {
        let store = Self::new();
        store.health().configured = false;
        store
    }

    /// Simulate the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.health().available = available;
    }

    /// Let the next `successful` commits through, then fail every commit
    /// until [`Self::clear_failures`] is called.
    pub fn fail_after_commits(&self, successful: usize) {
        self.health().commits_before_failure = Some(successful);
    }

    /// Remove injected commit failures.
    pub fn clear_failures(&self) {
        self.health().commits_before_failure = None;
    }

    /// Number of batches committed so far.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents().len()
    }

    /// Whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    /// Snapshot of one document.
    #[must_use]
    pub fn document(&self, id: &ProductId) -> Option<StoredProduct> {
        self.documents().get(id).cloned()
    }

    /// Snapshot of every document, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StoredProduct> {
        self.documents().values().cloned().collect()
    }

    /// Write a document directly, bypassing batches and health checks.
    pub fn insert_raw(&self, document: StoredProduct) {
        self.documents()
            .insert(document.product.id.clone(), document);
    }

    fn documents(&self) -> MutexGuard<'_, BTreeMap<ProductId, StoredProduct>> {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn health(&self) -> MutexGuard<'_, Health> {
        self.inner
            .health
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        let health = *self.health();
        if !health.configured {
            return Err(StoreError::NotConfigured);
        }
        if !health.available {
            return Err(StoreError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    /// Consume one unit of the injected failure budget.
    fn check_commit_allowed(&self) -> Result<(), StoreError> {
        let mut health = self.health();
        match health.commits_before_failure {
            Some(0) => Err(StoreError::Write("injected commit failure".to_string())),
            Some(n) => {
                health.commits_before_failure = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ProductStore for MemoryStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<StoredProduct>, StoreError> {
        self.check_reachable()?;
        tokio::task::yield_now().await;

        let documents = self.documents();
        let by_id: BTreeMap<&ProductId, &StoredProduct> =
            documents.iter().map(|(id, doc)| (id, doc)).collect();
        let selected = query.apply(documents.values().map(|d| &d.product));

        Ok(selected
            .into_iter()
            .filter_map(|p| by_id.get(&p.id).map(|doc| (*doc).clone()))
            .collect())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<StoredProduct>, StoreError> {
        self.check_reachable()?;
        tokio::task::yield_now().await;

        let documents = self.documents();
        Ok(ids.iter().filter_map(|id| documents.get(id).cloned()).collect())
    }

    async fn list_ids(&self) -> Result<Vec<ProductId>, StoreError> {
        self.check_reachable()?;
        tokio::task::yield_now().await;

        Ok(self.documents().keys().cloned().collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        self.check_reachable()?;
        if batch.len() > self.inner.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                max: self.inner.max_batch_size,
            });
        }
        // Suspend like a network round-trip so concurrent writers can interleave.
        tokio::task::yield_now().await;
        self.check_commit_allowed()?;

        let applied = batch.len();
        {
            let mut documents = self.documents();
            for op in batch.into_ops() {
                match op {
                    WriteOp::Upsert(doc) => {
                        documents.insert(doc.product.id.clone(), *doc);
                    }
                    WriteOp::Delete(id) => {
                        documents.remove(&id);
                    }
                }
            }
        }
        let commit_no = self.inner.commits.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(commit_no, applied, "Committed in-memory batch");
        Ok(applied)
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }
}
