//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness
//! GET  /health/ready             - Remote store reachability
//!
//! # Catalog (JSON, every listing carries `usingFallback`)
//! GET  /api/products             - ?category=&limit=&active_only=
//! GET  /api/products/featured    - ?limit=
//! GET  /api/products/{id}        - Product detail
//! GET  /api/search               - ?q=&limit=
//! GET  /api/stats                - Aggregates over the current read path
//! ```

pub mod health;
pub mod products;
pub mod search;
pub mod stats;

use axum::{Router, routing::get};

use crate::error::add_breadcrumb;
use crate::state::AppState;

/// Largest page a client may request.
pub const MAX_LIMIT: usize = 100;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/{id}", get(products::show))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/search", get(search::search))
        .route("/stats", get(stats::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// Clamp a client-supplied limit.
fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).min(MAX_LIMIT)
}

/// Leave a Sentry breadcrumb when a read was served from the canonical catalog.
fn note_fallback(operation: &str, using_fallback: bool) {
    if using_fallback {
        add_breadcrumb(
            "catalog",
            "Served from canonical catalog",
            Some(&[("operation", operation)]),
        );
    }
}
