//! Unified error handling with Sentry integration.
//!
//! Catalog reads never fail (they fall back), so handlers only produce bad
//! input, unknown products, and a not-ready remote store on the readiness check.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use electroshop_core::{CategoryParseError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A dependency is not reachable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<CategoryParseError> for AppError {
    fn from(err: CategoryParseError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => {
                // WARN is forwarded to Sentry by the tracing layer
                tracing::warn!(error = %self, "Request error");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a catalog read.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of reads
/// leading up to an error, including whether they were served degraded.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
