//! Integration tests for Electroshop.
//!
//! The tests drive the sync engine and the read gateway together against an
//! in-memory remote store, so they run without a database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p electroshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `sync_engine` - Import, update, clear and pipeline behaviour
//! - `read_fallback` - Remote reads, degraded reads and debounced search

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use electroshop_catalog::{
    CanonicalCatalog, CatalogError, MemoryStore, ReadGateway, SyncEngine, SyncOptions,
};

/// Engine, gateway and the store they share.
pub struct TestContext {
    pub catalog: Arc<CanonicalCatalog>,
    pub store: MemoryStore,
    pub engine: Arc<SyncEngine<MemoryStore>>,
    pub gateway: Arc<ReadGateway<MemoryStore>>,
}

impl TestContext {
    /// Empty reachable store with the embedded catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails to load.
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_store(MemoryStore::new(), SyncOptions::default())
    }

    /// Context over an explicit store and engine options.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails to load.
    pub fn with_store(store: MemoryStore, options: SyncOptions) -> Result<Self, CatalogError> {
        let catalog = Arc::new(CanonicalCatalog::load_embedded()?);
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            Arc::clone(&catalog),
            options,
        ));
        let gateway = Arc::new(ReadGateway::new(store.clone(), Arc::clone(&catalog)));
        Ok(Self {
            catalog,
            store,
            engine,
            gateway,
        })
    }

    /// Number of canonical records.
    #[must_use]
    pub fn canonical_len(&self) -> usize {
        self.catalog.len()
    }
}
