//! Search route handler.
//!
//! Debouncing is a client-session concern and lives in
//! `electroshop_catalog::SearchDebouncer`; over HTTP each request is a
//! complete search.

use axum::{
    Json,
    extract::{Query, State},
};
use electroshop_catalog::QueryResult;
use serde::Deserialize;
use tracing::instrument;

use super::{clamp_limit, note_fallback};
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Case-insensitive substring search over active products.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<QueryResult> {
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT);
    let result = state.gateway().search_query(&params.q, limit).await;
    note_fallback("search", result.using_fallback);
    Json(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::offline_state;

    #[tokio::test]
    async fn test_search_matches_brand() {
        let params = SearchParams {
            q: "HikVision".to_string(),
            limit: None,
        };
        let Json(result) = search(State(offline_state()), Query(params)).await;

        assert!(result.using_fallback);
        assert!(!result.records.is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let Json(result) = search(State(offline_state()), Query(SearchParams::default())).await;
        assert!(result.records.is_empty());
    }
}
