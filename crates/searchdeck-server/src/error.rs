use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use searchdeck_core::error::CoreError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid time range: {0}")]
    InvalidRange(String),

    #[error("duplicate metric column: {0}")]
    DuplicateMetric(String),

    #[error("slot {0} is already occupied")]
    SlotOccupied(usize),

    #[error("no rows to export")]
    ExportEmpty,

    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidRangeFormat(_) => AppError::InvalidRange(err.to_string()),
            CoreError::DuplicateMetric { .. } => AppError::DuplicateMetric(err.to_string()),
            CoreError::SlotOccupied(index) => AppError::SlotOccupied(index),
            CoreError::ExportEmpty => AppError::ExportEmpty,
            CoreError::AnalyticsFetchFailed { .. } => AppError::UpstreamFetch(err.to_string()),
            CoreError::ExportFailed(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::InvalidRange(msg) => (StatusCode::BAD_REQUEST, "invalid_range", msg.clone()),
            AppError::DuplicateMetric(msg) => {
                (StatusCode::CONFLICT, "duplicate_metric", msg.clone())
            }
            AppError::SlotOccupied(index) => (
                StatusCode::CONFLICT,
                "slot_occupied",
                format!("slot {index} is already occupied"),
            ),
            AppError::ExportEmpty => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "export_empty",
                "no reconciled rows to export".to_string(),
            ),
            AppError::UpstreamFetch(msg) => {
                (StatusCode::BAD_GATEWAY, "upstream_fetch_failed", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": null
                }
            })),
        )
            .into_response()
    }
}
