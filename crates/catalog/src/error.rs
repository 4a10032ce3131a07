//! Error types for the catalog crate.

use electroshop_core::{Category, ProductId, ValidationError};
use thiserror::Error;

use crate::store::StoreError;

/// Fatal errors loading the canonical dataset.
///
/// These are startup failures: a binary that cannot load its catalog should
/// not start.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The embedded dataset is not valid YAML or does not match the schema.
    #[error("failed to parse catalog dataset: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A record violates a data-model invariant.
    #[error("invalid catalog record: {0}")]
    Invalid(#[from] ValidationError),

    /// Two records share an id.
    #[error("duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),
}

/// Failure of a sync engine operation.
///
/// Never crosses the engine boundary: every public operation converts it into
/// a result object with `success: false`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote store is unreachable or not configured.
    #[error("remote store unavailable: {0}")]
    Configuration(#[source] StoreError),

    /// A batch commit failed. `committed` records made it before the failure.
    #[error("write failed after {committed} committed records: {source}")]
    Write {
        /// Records durably written by earlier batches.
        committed: usize,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Category import selected nothing.
    #[error("no products found in category '{0}'")]
    EmptySelection(Category),

    /// A record failed validation before any write was attempted.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Any other store failure (reads during sync).
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl SyncError {
    /// Classify a store error raised outside a batch commit.
    #[must_use]
    pub fn from_store(err: StoreError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Store(err)
        }
    }

    /// Records committed before the failure.
    #[must_use]
    pub const fn committed(&self) -> usize {
        match self {
            Self::Write { committed, .. } => *committed,
            _ => 0,
        }
    }
}
