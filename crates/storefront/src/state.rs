//! Application state shared across handlers.

use std::sync::Arc;

use electroshop_catalog::{CanonicalCatalog, PgProductStore, ReadGateway};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog read path and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    gateway: ReadGateway<PgProductStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Remote store handle (possibly unconfigured)
    /// * `catalog` - Canonical catalog used for fallback reads
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: PgProductStore,
        catalog: Arc<CanonicalCatalog>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway: ReadGateway::new(store, catalog),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog read gateway.
    #[must_use]
    pub fn gateway(&self) -> &ReadGateway<PgProductStore> {
        &self.inner.gateway
    }
}
