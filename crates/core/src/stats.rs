//! Aggregate counts over a list of products.
//!
//! The aggregator does not care where the records came from: the remote store
//! and the canonical catalog produce identical [`CatalogStats`] for identical
//! input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Category, Product};

/// Counts and groupings over a record list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub featured: usize,
    pub in_stock: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub by_brand: BTreeMap<String, usize>,
}

impl CatalogStats {
    /// Aggregate a record list.
    #[must_use]
    pub fn from_products<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a Product>,
    {
        products
            .into_iter()
            .fold(Self::default(), |mut stats, product| {
                stats.record(product);
                stats
            })
    }

    fn record(&mut self, product: &Product) {
        self.total += 1;
        self.active += usize::from(product.is_active);
        self.featured += usize::from(product.is_featured);
        self.in_stock += usize::from(product.in_stock);
        *self.by_category.entry(product.category).or_insert(0) += 1;
        *self.by_brand.entry(product.brand.clone()).or_insert(0) += 1;
    }

    /// Count for one category (zero when absent).
    #[must_use]
    pub fn category_count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}
