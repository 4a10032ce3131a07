//! Electroshop Catalog - sync engine and fallback read path.
//!
//! The canonical catalog is compiled into the binary and is the only source of
//! product content. The remote store holds a derived copy:
//!
//! - [`sync::SyncEngine`] pushes canonical records into the store in bounded,
//!   atomic batches, one writer at a time.
//! - [`gateway::ReadGateway`] reads from the store and falls back to the
//!   canonical catalog on the first remote error, with the same filter, order
//!   and limit semantics.
//! - [`search::SearchDebouncer`] wraps gateway search with a quiescence window
//!   so only the latest term's result is delivered.
//!
//! Store access goes through the [`store::ProductStore`] trait; callers inject
//! a [`store::PgProductStore`] in production and a [`store::MemoryStore`] in
//! tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod canonical;
pub mod config;
pub mod error;
pub mod gateway;
pub mod search;
pub mod store;
pub mod sync;

pub use canonical::CanonicalCatalog;
pub use config::{ConfigError, StoreConfig};
pub use error::{CatalogError, SyncError};
pub use gateway::{ProductLookup, ProductQuery, QueryResult, ReadGateway, StatsResult};
pub use search::{DEFAULT_DEBOUNCE, SearchDebouncer, SearchOutcome};
pub use store::{
    MemoryStore, Order, PgProductStore, ProductStore, StoreError, StoreQuery, WriteBatch, WriteOp,
};
pub use sync::{
    FullImportOptions, PipelineResult, SyncEngine, SyncOptions, SyncResult, UpdateResult,
    VerifyResult,
};
