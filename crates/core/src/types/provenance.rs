//! Provenance metadata stamped on records written to the remote store.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, CategoryParseError, Product};

/// Which sync operation produced a remote record.
///
/// Serialized as `static_import`, `category_import_<category>` or
/// `incremental_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataSource {
    /// Full catalog import.
    StaticImport,
    /// Category-scoped import.
    CategoryImport(Category),
    /// Written by the update operation.
    IncrementalUpdate,
}

impl DataSource {
    const CATEGORY_PREFIX: &'static str = "category_import_";
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticImport => f.write_str("static_import"),
            Self::CategoryImport(c) => write!(f, "{}{c}", Self::CATEGORY_PREFIX),
            Self::IncrementalUpdate => f.write_str("incremental_update"),
        }
    }
}

impl std::str::FromStr for DataSource {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static_import" => Ok(Self::StaticImport),
            "incremental_update" => Ok(Self::IncrementalUpdate),
            _ => s
                .strip_prefix(Self::CATEGORY_PREFIX)
                .ok_or_else(|| CategoryParseError::Unknown(s.to_owned()))?
                .parse()
                .map(Self::CategoryImport),
        }
    }
}

impl TryFrom<String> for DataSource {
    type Error = CategoryParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataSource> for String {
    fn from(source: DataSource) -> Self {
        source.to_string()
    }
}

/// Sync metadata attached to a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    /// Set by import operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
    /// Set by the update operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Engine run that last wrote the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_run_id: Option<Uuid>,
}

impl Provenance {
    /// Provenance for a freshly imported record.
    #[must_use]
    pub const fn imported(source: DataSource, at: DateTime<Utc>, run: Uuid) -> Self {
        Self {
            data_source: Some(source),
            imported_at: Some(at),
            last_modified: None,
            sync_run_id: Some(run),
        }
    }

    /// Provenance for a record written by the update operation.
    #[must_use]
    pub const fn modified(at: DateTime<Utc>, run: Uuid) -> Self {
        Self {
            data_source: Some(DataSource::IncrementalUpdate),
            imported_at: None,
            last_modified: Some(at),
            sync_run_id: Some(run),
        }
    }
}

/// A remote document: the product fields plus provenance, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl StoredProduct {
    /// Wrap a product with provenance.
    #[must_use]
    pub const fn new(product: Product, provenance: Provenance) -> Self {
        Self {
            product,
            provenance,
        }
    }

    /// Drop provenance, keeping the product.
    #[must_use]
    pub fn into_product(self) -> Product {
        self.product
    }
}
