//! Electroshop CLI - migrations and catalog sync.
//!
//! # Usage
//!
//! ```bash
//! # Create the catalog table
//! es-cli migrate
//!
//! # Push the canonical catalog to the remote store
//! es-cli sync full --clear
//! es-cli sync category cameras
//! es-cli sync update
//! es-cli sync clear
//! es-cli sync pipeline --clear --category solaire
//!
//! # Inspect
//! es-cli verify
//! es-cli stats --canonical
//! ```
//!
//! Results are printed as JSON on stdout. The exit code is 1 when a result
//! reports `success: false` or the command could not run at all.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use electroshop_core::Category;

mod commands;

#[derive(Parser)]
#[command(name = "es-cli")]
#[command(author, version, about = "Electroshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations for the catalog store
    Migrate,
    /// Write the canonical catalog to the remote store
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// Aggregate every record in the remote store
    Verify,
    /// Catalog statistics
    Stats {
        /// Aggregate the canonical catalog instead of the remote store
        #[arg(long)]
        canonical: bool,
    },
}

#[derive(Subcommand)]
enum SyncAction {
    /// Upsert every canonical product
    Full {
        /// Delete every remote product first
        #[arg(long)]
        clear: bool,
    },
    /// Upsert the products of one category
    Category {
        /// Category to import (e.g. cameras, solaire)
        category: Category,
    },
    /// Insert missing products and overwrite existing ones
    Update,
    /// Delete every remote product
    Clear,
    /// Clear, import and verify in one run
    Pipeline {
        /// Delete every remote product first
        #[arg(long)]
        clear: bool,
        /// Import only this category
        #[arg(long)]
        category: Option<Category>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (RUST_LOG, default info)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Execute a command. `Ok(false)` means it ran and reported failure.
async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let success = match cli.command {
        Commands::Migrate => {
            commands::migrate::run().await?;
            true
        }
        Commands::Sync { action } => {
            let engine = commands::sync::engine()?;
            match action {
                SyncAction::Full { clear } => commands::sync::full(&engine, clear).await?,
                SyncAction::Category { category } => {
                    commands::sync::category(&engine, category).await?
                }
                SyncAction::Update => commands::sync::update(&engine).await?,
                SyncAction::Clear => commands::sync::clear(&engine).await?,
                SyncAction::Pipeline { clear, category } => {
                    commands::sync::pipeline(&engine, clear, category).await?
                }
            }
        }
        Commands::Verify => commands::report::verify().await?,
        Commands::Stats { canonical } => commands::report::stats(canonical).await?,
    };
    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_category_import() {
        let cli = Cli::try_parse_from(["es-cli", "sync", "category", "solaire"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Sync {
                action: SyncAction::Category {
                    category: Category::Solaire
                }
            })
        ));
    }

    #[test]
    fn test_sentinel_is_not_an_importable_category() {
        assert!(Cli::try_parse_from(["es-cli", "sync", "category", "all"]).is_err());
    }

    #[test]
    fn test_parse_pipeline_flags() {
        let cli = Cli::try_parse_from([
            "es-cli",
            "sync",
            "pipeline",
            "--clear",
            "--category",
            "pc",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Sync {
                action: SyncAction::Pipeline {
                    clear: true,
                    category: Some(Category::Pc)
                }
            })
        ));
    }
}
