//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! es-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). Required for this command.
//!
//! # Migration Files
//!
//! Stored in `crates/catalog/migrations/` and embedded into the binary.

use electroshop_catalog::{PgProductStore, StoreConfig};
use tracing::info;

/// Run catalog store migrations.
///
/// # Errors
///
/// Returns an error if no database URL is set, the connection fails, or a
/// migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env_required()?;

    info!("Connecting to catalog database...");
    let store = PgProductStore::from_config(&config)?;

    info!("Running catalog migrations...");
    store.migrate().await?;

    info!("Catalog migrations complete!");
    Ok(())
}
