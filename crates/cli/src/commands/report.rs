//! Read-only reporting commands.

use electroshop_catalog::{CanonicalCatalog, PgProductStore, StoreConfig, SyncEngine, SyncOptions};
use electroshop_core::CatalogStats;
use tracing::info;

use super::print_json;

/// `es-cli verify`: aggregate the remote store.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the result cannot be printed.
pub async fn verify() -> Result<bool, Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let store = PgProductStore::from_config(&config)?;
    let catalog = CanonicalCatalog::embedded()?;
    let expected = catalog.len();

    let result = SyncEngine::new(store, catalog, SyncOptions::from(&config))
        .verify()
        .await;
    if let Some(stats) = &result.stats {
        info!(remote = stats.total, canonical = expected, "Verification counts");
    }
    print_json(&result)?;
    Ok(result.success)
}

/// `es-cli stats [--canonical]`
///
/// Without `--canonical` this is the remote aggregate (same as `verify`).
///
/// # Errors
///
/// Returns an error if the catalog or configuration is invalid.
pub async fn stats(canonical: bool) -> Result<bool, Box<dyn std::error::Error>> {
    if !canonical {
        return verify().await;
    }
    let catalog = CanonicalCatalog::embedded()?;
    let stats = CatalogStats::from_products(catalog.all());
    print_json(&stats)?;
    Ok(true)
}
