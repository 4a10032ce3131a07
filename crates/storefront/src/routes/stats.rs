//! Catalog statistics handler.

use axum::{Json, extract::State};
use electroshop_catalog::StatsResult;
use tracing::instrument;

use super::note_fallback;
use crate::state::AppState;

/// Aggregates over whichever source currently serves reads.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<StatsResult> {
    let result = state.gateway().stats().await;
    note_fallback("stats", result.using_fallback);
    Json(result)
}
