//! Product reads with transparent fallback to the canonical catalog.
//!
//! Each read goes to the remote store once. If that fails for any reason, or
//! the store answers with nothing, the same filter, order and limit are
//! applied to the canonical catalog instead and the result is flagged with
//! `using_fallback`. There are no retries and no cache; calls are independent.

use std::sync::Arc;

use electroshop_core::search::SearchTerm;
use electroshop_core::{CatalogStats, CategoryFilter, Product, ProductId, StoredProduct};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::canonical::CanonicalCatalog;
use crate::store::{Order, ProductStore, StoreError, StoreQuery};

/// Parameters of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: CategoryFilter,
    pub active_only: bool,
    pub order_by_recency_desc: bool,
    pub limit: Option<usize>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            active_only: true,
            order_by_recency_desc: true,
            limit: None,
        }
    }
}

impl ProductQuery {
    /// Active products of every category, newest first, uncapped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<CategoryFilter>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub const fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    #[must_use]
    pub const fn order_by_recency_desc(mut self, desc: bool) -> Self {
        self.order_by_recency_desc = desc;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Equivalent store-level query.
    #[must_use]
    pub fn to_store_query(&self) -> StoreQuery {
        StoreQuery {
            category: self.category.category(),
            is_active: self.active_only.then_some(true),
            is_featured: None,
            order: if self.order_by_recency_desc {
                Order::CreatedAtDesc
            } else {
                Order::IdAsc
            },
            limit: self.limit,
        }
    }
}

/// Records plus where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub records: Vec<Product>,
    /// `true` when the records come from the canonical catalog.
    pub using_fallback: bool,
}

impl QueryResult {
    fn remote(documents: Vec<StoredProduct>) -> Self {
        Self {
            records: documents
                .into_iter()
                .map(StoredProduct::into_product)
                .collect(),
            using_fallback: false,
        }
    }

    fn fallback<'a>(records: impl IntoIterator<Item = &'a Product>) -> Self {
        Self {
            records: records.into_iter().cloned().collect(),
            using_fallback: true,
        }
    }
}

/// A single-product lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLookup {
    pub record: Option<Product>,
    pub using_fallback: bool,
}

/// Aggregates plus where the records came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResult {
    pub stats: CatalogStats,
    pub using_fallback: bool,
}

/// Why a read was served from the canonical catalog.
enum Degraded {
    Failed(StoreError),
    Empty,
}

/// Read path over a remote store with canonical fallback.
#[derive(Debug, Clone)]
pub struct ReadGateway<S> {
    store: S,
    catalog: Arc<CanonicalCatalog>,
}

impl<S: ProductStore> ReadGateway<S> {
    #[must_use]
    pub const fn new(store: S, catalog: Arc<CanonicalCatalog>) -> Self {
        Self { store, catalog }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn catalog(&self) -> &CanonicalCatalog {
        &self.catalog
    }

    /// List products.
    #[instrument(skip(self))]
    pub async fn query(&self, query: &ProductQuery) -> QueryResult {
        let store_query = query.to_store_query();
        match self.remote(&store_query).await {
            Ok(documents) => QueryResult::remote(documents),
            Err(cause) => {
                log_fallback("query", &cause);
                QueryResult::fallback(store_query.apply(self.catalog.all()))
            }
        }
    }

    /// Active featured products, newest first, at most `limit`.
    ///
    /// The fallback pads a short featured list with the first active
    /// non-featured records in catalog order.
    #[instrument(skip(self))]
    pub async fn featured_query(&self, limit: usize) -> QueryResult {
        let store_query = StoreQuery {
            is_active: Some(true),
            is_featured: Some(true),
            order: Order::CreatedAtDesc,
            limit: Some(limit),
            ..StoreQuery::default()
        };
        match self.remote(&store_query).await {
            Ok(documents) => QueryResult::remote(documents),
            Err(cause) => {
                log_fallback("featured_query", &cause);
                let mut records = store_query.apply(self.catalog.all());
                let missing = limit.saturating_sub(records.len());
                records.extend(
                    self.catalog
                        .all()
                        .iter()
                        .filter(|p| p.is_active && !p.is_featured)
                        .take(missing),
                );
                QueryResult::fallback(records)
            }
        }
    }

    /// Active products whose text fields contain `term`, newest first.
    ///
    /// The store has no text search, so the active set is fetched and
    /// filtered here. A blank term matches nothing and skips the store.
    #[instrument(skip(self))]
    pub async fn search_query(&self, term: &str, limit: usize) -> QueryResult {
        let Some(term) = SearchTerm::new(term) else {
            return QueryResult {
                records: Vec::new(),
                using_fallback: false,
            };
        };
        let store_query = StoreQuery {
            is_active: Some(true),
            order: Order::CreatedAtDesc,
            ..StoreQuery::default()
        };

        match self.remote(&store_query).await {
            Ok(documents) => {
                let mut result = QueryResult::remote(documents);
                result.records.retain(|p| term.matches(p));
                result.records.truncate(limit);
                result
            }
            Err(cause) => {
                log_fallback("search_query", &cause);
                QueryResult::fallback(
                    store_query
                        .apply(self.catalog.all())
                        .into_iter()
                        .filter(|p| term.matches(p))
                        .take(limit),
                )
            }
        }
    }

    /// One product by id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> ProductLookup {
        let found = self
            .store
            .get_many(std::slice::from_ref(id))
            .await
            .map_err(Degraded::Failed)
            .and_then(|docs| docs.into_iter().next().ok_or(Degraded::Empty));

        match found {
            Ok(doc) => ProductLookup {
                record: Some(doc.into_product()),
                using_fallback: false,
            },
            Err(cause) => {
                log_fallback("get_product", &cause);
                ProductLookup {
                    record: self.catalog.get(id).cloned(),
                    using_fallback: true,
                }
            }
        }
    }

    /// Aggregates over every record on the current read path.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> StatsResult {
        match self.remote(&StoreQuery::all()).await {
            Ok(documents) => StatsResult {
                stats: CatalogStats::from_products(documents.iter().map(|d| &d.product)),
                using_fallback: false,
            },
            Err(cause) => {
                log_fallback("stats", &cause);
                StatsResult {
                    stats: CatalogStats::from_products(self.catalog.all()),
                    using_fallback: true,
                }
            }
        }
    }

    /// Whether the remote store answers.
    pub async fn is_remote_ready(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    /// An empty answer counts as degraded unless the caller asked for none.
    async fn remote(&self, query: &StoreQuery) -> Result<Vec<StoredProduct>, Degraded> {
        let documents = self.store.query(query).await.map_err(Degraded::Failed)?;
        if documents.is_empty() && query.limit != Some(0) {
            return Err(Degraded::Empty);
        }
        debug!(records = documents.len(), "Served from remote store");
        Ok(documents)
    }
}

fn log_fallback(operation: &str, cause: &Degraded) {
    match cause {
        Degraded::Failed(e) => {
            warn!(operation, error = %e, "Remote read failed, serving canonical catalog");
        }
        Degraded::Empty => {
            warn!(operation, "Remote store returned no records, serving canonical catalog");
        }
    }
}
