//! The canonical product catalog.
//!
//! The dataset in `data/products.yaml` is compiled into the binary and never
//! mutated at runtime. Loading validates every record; a malformed dataset is a
//! startup failure.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use electroshop_core::search::filter_text;
use electroshop_core::{Category, CategoryFilter, Product, ProductId};
use tracing::{debug, instrument};

use crate::error::CatalogError;

/// The dataset shipped with the application.
const EMBEDDED_DATASET: &str = include_str!("../data/products.yaml");

/// Immutable, validated list of products treated as ground truth.
#[derive(Debug, Clone)]
pub struct CanonicalCatalog {
    products: Vec<Product>,
}

impl CanonicalCatalog {
    /// Build a catalog from records, validating each and rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` or `CatalogError::DuplicateId`.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen: HashSet<&ProductId> = HashSet::with_capacity(products.len());
        for product in &products {
            product.validate()?;
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// Parse and validate a YAML dataset.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed YAML, or a validation error.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_yaml::from_str(yaml)?;
        Self::from_products(products)
    }

    /// Load the dataset compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the shipped dataset is broken.
    #[instrument]
    pub fn load_embedded() -> Result<Self, CatalogError> {
        let catalog = Self::from_yaml(EMBEDDED_DATASET)?;
        debug!(products = catalog.len(), "Loaded embedded catalog");
        Ok(catalog)
    }

    /// Process-wide shared instance of the embedded dataset, loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns an error only if the shipped dataset is broken. A failed load
    /// is not cached.
    pub fn embedded() -> Result<Arc<Self>, CatalogError> {
        static EMBEDDED: OnceLock<Arc<CanonicalCatalog>> = OnceLock::new();

        if let Some(catalog) = EMBEDDED.get() {
            return Ok(Arc::clone(catalog));
        }
        let loaded = Arc::new(Self::load_embedded()?);
        Ok(Arc::clone(EMBEDDED.get_or_init(|| loaded)))
    }

    /// Every record, in dataset order.
    #[must_use]
    pub fn all(&self) -> &[Product] {
        &self.products
    }

    /// Records of one category, in dataset order.
    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<&Product> {
        self.matching(CategoryFilter::Only(category))
    }

    /// Records passing a category filter, in dataset order.
    #[must_use]
    pub fn matching(&self, filter: CategoryFilter) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| filter.accepts(p.category))
            .collect()
    }

    /// Case-insensitive substring search over name, description, brand, tags
    /// and features. A blank term matches nothing.
    #[must_use]
    pub fn filter_text(&self, term: &str) -> Vec<&Product> {
        filter_text(&self.products, term)
    }

    /// Look up one record.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Records flagged as featured, in dataset order.
    #[must_use]
    pub fn featured(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_featured).collect()
    }

    /// Categories with at least one record, in taxonomy order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.products.iter().any(|p| p.category == *c))
            .collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
