//! Remote document store seam.
//!
//! The store holds one collection of product documents keyed by id. Reads
//! support equality filters on `category`, `isActive` and `isFeatured`,
//! ordering by `createdAt` descending and an optional cap. Writes are grouped
//! into [`WriteBatch`]es that commit atomically; a store refuses batches above
//! its [`ProductStore::max_batch_size`].

mod memory;
mod postgres;

use std::future::Future;

use electroshop_core::{Category, Product, ProductId, StoredProduct};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgProductStore;

/// Largest batch any store accepts by default (common document-store cap).
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// Errors raised by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection settings were provided.
    #[error("remote store is not configured")]
    NotConfigured,

    /// The store could not be reached.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// A batch commit failed and was rolled back.
    #[error("batch commit failed: {0}")]
    Write(String),

    /// The batch exceeds what the store commits atomically.
    #[error("batch of {size} operations exceeds store limit of {max}")]
    BatchTooLarge {
        /// Operations in the rejected batch.
        size: usize,
        /// Store limit.
        max: usize,
    },

    /// A stored document could not be decoded.
    #[error("malformed document {id}: {source}")]
    Document {
        /// Offending document key.
        id: String,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the error means the store is unreachable or unconfigured, as
    /// opposed to a failure of one particular request.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::NotConfigured | Self::Unavailable(_) => true,
            Self::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Configuration(_)
            ),
            _ => false,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending id, compared bytewise.
    #[default]
    IdAsc,
    /// Newest `createdAt` first, ties broken by id.
    CreatedAtDesc,
}

/// A read against the product collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreQuery {
    pub category: Option<Category>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub order: Order,
    pub limit: Option<usize>,
}

impl StoreQuery {
    /// Every document, no filters.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether a product passes the equality filters.
    #[must_use]
    pub fn accepts(&self, product: &Product) -> bool {
        self.category.is_none_or(|c| product.category == c)
            && self.is_active.is_none_or(|a| product.is_active == a)
            && self.is_featured.is_none_or(|f| product.is_featured == f)
    }

    /// Apply filters, ordering and cap to an in-memory list.
    ///
    /// This is the reference semantics every store must match; the canonical
    /// fallback path uses it directly.
    #[must_use]
    pub fn apply<'a, I>(&self, products: I) -> Vec<&'a Product>
    where
        I: IntoIterator<Item = &'a Product>,
    {
        let mut selected: Vec<&Product> =
            products.into_iter().filter(|p| self.accepts(p)).collect();
        match self.order {
            Order::IdAsc => selected.sort_by(|a, b| a.id.cmp(&b.id)),
            Order::CreatedAtDesc => selected.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// One operation inside a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or fully replace the document with this id.
    Upsert(Box<StoredProduct>),
    /// Remove the document with this id (no-op if absent).
    Delete(ProductId),
}

impl WriteOp {
    /// Key of the document this operation touches.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Upsert(doc) => &doc.product.id,
            Self::Delete(id) => id,
        }
    }
}

/// Operations committed together, all or nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an upsert.
    pub fn upsert(&mut self, document: StoredProduct) {
        self.ops.push(WriteOp::Upsert(Box::new(document)));
    }

    /// Append a delete.
    pub fn delete(&mut self, id: ProductId) {
        self.ops.push(WriteOp::Delete(id));
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operations, in insertion order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<T: IntoIterator<Item = WriteOp>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Access to the remote product collection.
///
/// Implementations must be cheap to share (`Clone` over an `Arc` or a pool).
pub trait ProductStore: Send + Sync {
    /// Run a filtered read.
    fn query(
        &self,
        query: &StoreQuery,
    ) -> impl Future<Output = Result<Vec<StoredProduct>, StoreError>> + Send;

    /// Fetch the documents whose ids are in `ids`. Missing ids are skipped.
    fn get_many(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<StoredProduct>, StoreError>> + Send;

    /// Every document id in the collection.
    fn list_ids(&self) -> impl Future<Output = Result<Vec<ProductId>, StoreError>> + Send;

    /// Commit a batch atomically. Returns the number of operations applied.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Largest batch this store commits atomically.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Cheap connectivity check.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
