//! Product listing and detail handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use electroshop_catalog::{ProductQuery, QueryResult};
use electroshop_core::{CategoryFilter, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{MAX_LIMIT, clamp_limit, note_fallback};
use crate::error::{AppError, Result};
use crate::state::AppState;

const DEFAULT_FEATURED_LIMIT: usize = 8;

/// Product listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Category name or `all`.
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub active_only: Option<bool>,
}

/// Featured listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<usize>,
}

/// Product detail response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub record: Product,
    pub using_fallback: bool,
}

/// List products, newest first.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<QueryResult>> {
    let category = CategoryFilter::from_param(params.category.as_deref())?;
    let mut query = ProductQuery::new()
        .category(category)
        .active_only(params.active_only.unwrap_or(true));
    if let Some(limit) = params.limit {
        query = query.limit(limit.min(MAX_LIMIT));
    }

    let result = state.gateway().query(&query).await;
    note_fallback("products", result.using_fallback);
    Ok(Json(result))
}

/// Featured products.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<FeaturedParams>,
) -> Json<QueryResult> {
    let limit = clamp_limit(params.limit, DEFAULT_FEATURED_LIMIT);
    let result = state.gateway().featured_query(limit).await;
    note_fallback("featured", result.using_fallback);
    Json(result)
}

/// Product detail.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a blank id and `AppError::NotFound`
/// when neither the remote store nor the catalog has the product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id = ProductId::parse(&id)?;
    let lookup = state.gateway().get_product(&id).await;
    note_fallback("product", lookup.using_fallback);

    let record = lookup
        .record
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    Ok(Json(ProductResponse {
        record,
        using_fallback: lookup.using_fallback,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::offline_state;
    use electroshop_core::Category;

    #[tokio::test]
    async fn test_index_filters_by_category() {
        let params = ListParams {
            category: Some("cameras".to_string()),
            ..ListParams::default()
        };
        let Json(result) = index(State(offline_state()), Query(params)).await.unwrap();

        assert!(result.using_fallback);
        assert!(!result.records.is_empty());
        assert!(result.records.iter().all(|p| p.category == Category::Cameras));
    }

    #[tokio::test]
    async fn test_index_rejects_unknown_category() {
        let params = ListParams {
            category: Some("toys".to_string()),
            ..ListParams::default()
        };
        let err = index(State(offline_state()), Query(params)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_index_caps_limit() {
        let params = ListParams {
            limit: Some(3),
            ..ListParams::default()
        };
        let Json(result) = index(State(offline_state()), Query(params)).await.unwrap();
        assert_eq!(result.records.len(), 3);
    }

    #[tokio::test]
    async fn test_featured_uses_default_limit() {
        let Json(result) = featured(State(offline_state()), Query(FeaturedParams::default())).await;
        assert_eq!(result.records.len(), DEFAULT_FEATURED_LIMIT);
        assert!(result.records.iter().any(|p| p.is_featured));
    }

    #[tokio::test]
    async fn test_show_known_and_unknown() {
        let Json(found) = show(State(offline_state()), Path("hik-001".to_string()))
            .await
            .unwrap();
        assert_eq!(found.record.price.to_string(), "1899.99");
        assert!(found.using_fallback);

        let err = show(State(offline_state()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
