//! Health check handlers.

use axum::extract::State;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable when the remote store does not answer.
/// Reads still work in that state; they are served from the canonical catalog.
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str> {
    if state.gateway().is_remote_ready().await {
        Ok("ready")
    } else {
        Err(AppError::Unavailable("remote store not reachable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::offline_state;

    #[tokio::test]
    async fn test_readiness_reports_unreachable_store() {
        let result = readiness(State(offline_state())).await;
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_liveness_ignores_store() {
        assert_eq!(health().await, "ok");
    }
}
