//! Remote store and sync configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). When neither is set the remote store is unconfigured and
//!   every read is served from the canonical catalog.
//! - `CATALOG_SYNC_BATCH_SIZE` - Records per atomic batch (default: 500, max: 500)
//! - `CATALOG_SEARCH_DEBOUNCE_MS` - Search quiescence window (default: 300)
//! - `CATALOG_DB_MAX_CONNECTIONS` - Pool size (default: 10)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::search::DEFAULT_DEBOUNCE;
use crate::store::DEFAULT_MAX_BATCH_SIZE;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Remote store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `PostgreSQL` connection URL (contains password). `None` = unconfigured.
    pub database_url: Option<SecretString>,
    /// Records per atomic write batch.
    pub batch_size: usize,
    /// Quiescence window for debounced search.
    pub search_debounce: Duration,
    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            batch_size: DEFAULT_MAX_BATCH_SIZE,
            search_debounce: DEFAULT_DEBOUNCE,
            max_connections: 10,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let batch_size = parse_env_or("CATALOG_SYNC_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 || batch_size > DEFAULT_MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_SYNC_BATCH_SIZE".to_string(),
                format!("must be between 1 and {DEFAULT_MAX_BATCH_SIZE} (got {batch_size})"),
            ));
        }

        let debounce_ms = parse_env_or(
            "CATALOG_SEARCH_DEBOUNCE_MS",
            u64::try_from(defaults.search_debounce.as_millis()).unwrap_or(300),
        )?;
        let max_connections =
            parse_env_or("CATALOG_DB_MAX_CONNECTIONS", defaults.max_connections)?;

        Ok(Self {
            database_url: get_database_url("CATALOG_DATABASE_URL"),
            batch_size,
            search_debounce: Duration::from_millis(debounce_ms),
            max_connections,
        })
    }

    /// Like [`Self::from_env`] but the database URL is mandatory.
    ///
    /// Used by commands that only make sense against a real store (migrations).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when no database URL is set.
    pub fn from_env_required() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        if config.database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "CATALOG_DATABASE_URL".to_string(),
            ));
        }
        Ok(config)
    }

    /// Whether a remote store is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.database_url.is_some()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    first_non_blank([
        std::env::var(primary_key).ok(),
        std::env::var("DATABASE_URL").ok(),
    ])
    .map(SecretString::from)
}

/// First candidate that is set and not whitespace-only.
fn first_non_blank<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_blank_primary_url_falls_through() {
        let fallback = Some("postgres://fallback/db".to_string());
        assert_eq!(
            first_non_blank([Some("   ".to_string()), fallback.clone()]),
            fallback
        );
        assert_eq!(first_non_blank([None, fallback.clone()]), fallback);
        assert_eq!(
            first_non_blank([Some("postgres://primary/db".to_string()), fallback]),
            Some("postgres://primary/db".to_string())
        );
        assert_eq!(first_non_blank([Some(String::new()), Some(" ".to_string())]), None);
    }

    #[test]
    fn test_parse_env_or_uses_default_when_unset() {
        let value = parse_env_or("ELECTROSHOP_TEST_SURELY_UNSET_VAR", 42_usize);
        assert!(matches!(value, Ok(42)));
    }
}
