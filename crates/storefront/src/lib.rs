//! Electroshop Storefront library.
//!
//! JSON read API over the product catalog. Every read goes through
//! [`electroshop_catalog::ReadGateway`], so the storefront keeps serving from
//! the canonical catalog when the remote store is down or not configured.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers wrap everything so panics and errors in any layer are
/// captured.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
