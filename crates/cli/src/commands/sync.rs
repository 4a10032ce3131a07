//! Catalog sync commands.
//!
//! Each command runs one sync engine operation against the configured
//! remote store and prints its result. An unconfigured or unreachable store
//! is not an error here: the engine reports it as `success: false`.

use electroshop_catalog::{
    CanonicalCatalog, FullImportOptions, PgProductStore, StoreConfig, SyncEngine, SyncOptions,
};
use electroshop_core::Category;
use tracing::info;

use super::print_json;

type Engine = SyncEngine<PgProductStore>;

/// Build an engine over the configured store and the embedded catalog.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the embedded catalog is broken.
pub fn engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let store = PgProductStore::from_config(&config)?;
    let catalog = CanonicalCatalog::embedded()?;
    info!(
        products = catalog.len(),
        batch_size = config.batch_size,
        remote_configured = store.is_configured(),
        "Sync engine ready"
    );
    Ok(SyncEngine::new(store, catalog, SyncOptions::from(&config)))
}

/// `es-cli sync full [--clear]`
///
/// # Errors
///
/// Returns an error if the result cannot be printed.
pub async fn full(engine: &Engine, clear: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let result = engine.full_import(clear).await;
    print_json(&result)?;
    Ok(result.success)
}

/// `es-cli sync category <category>`
///
/// # Errors
///
/// Returns an error if the result cannot be printed.
pub async fn category(
    engine: &Engine,
    category: Category,
) -> Result<bool, Box<dyn std::error::Error>> {
    let result = engine.import_by_category(category).await;
    print_json(&result)?;
    Ok(result.success)
}

/// `es-cli sync update`
///
/// # Errors
///
/// Returns an error if the result cannot be printed.
pub async fn update(engine: &Engine) -> Result<bool, Box<dyn std::error::Error>> {
    let result = engine.update_changed().await;
    print_json(&result)?;
    Ok(result.success)
}

/// `es-cli sync clear`
///
/// # Errors
///
/// Returns an error if the result cannot be printed.
pub async fn clear(engine: &Engine) -> Result<bool, Box<dyn std::error::Error>> {
    let result = engine.clear_all().await;
    print_json(&result)?;
    Ok(result.success)
}

/// `es-cli sync pipeline [--clear] [--category <category>]`
///
/// # Errors
///
/// Returns an error if the result cannot be printed.
pub async fn pipeline(
    engine: &Engine,
    clear_existing: bool,
    category: Option<Category>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let options = FullImportOptions {
        clear_existing,
        category,
    };
    let result = engine
        .perform_full_import(options, |phase| info!(phase, "Pipeline progress"))
        .await;
    print_json(&result)?;
    Ok(result.success)
}
