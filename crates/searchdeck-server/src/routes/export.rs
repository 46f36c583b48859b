use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;

use searchdeck_core::export::{export_csv, ExportScope};

use crate::{error::AppError, routes::reports::load_report, state::AppState};

/// Page size used when a page-scoped export does not name one.
const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub scope: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

fn parse_scope(q: &ExportQuery) -> Result<ExportScope, AppError> {
    match q.scope.as_deref().unwrap_or("all") {
        "all" => Ok(ExportScope::All),
        "page" => {
            let page = q
                .page
                .ok_or_else(|| AppError::BadRequest("scope=page requires a page number".to_string()))?;
            if page == 0 {
                return Err(AppError::BadRequest("page numbers start at 1".to_string()));
            }
            Ok(ExportScope::Page {
                page,
                per_page: q.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
            })
        }
        other => Err(AppError::BadRequest(format!(
            "unsupported scope: {other}; expected 'all' or 'page'"
        ))),
    }
}

/// `GET /api/reports/{id}/export` — download the reconciled rows as CSV.
///
/// Reads already-reconciled state only; an export never triggers a fetch.
/// Response: `Content-Type: text/csv` with `Content-Disposition: attachment`.
#[tracing::instrument(skip(state))]
pub async fn export_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
    Query(q): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let scope = parse_scope(&q)?;
    let report = load_report(&state, &report_id).await?;

    let csv_bytes = export_csv(&report.layout(), &report.rows, scope)?;

    let date = chrono::Utc::now().format("%Y-%m-%d");
    let filename = format!("report-{}-{}.csv", report.id, date);
    build_csv_response(&filename, Bytes::from(csv_bytes))
}

fn build_csv_response(filename: &str, csv_bytes: Bytes) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("response build failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(scope: Option<&str>, page: Option<usize>, per_page: Option<usize>) -> ExportQuery {
        ExportQuery {
            scope: scope.map(str::to_string),
            page,
            per_page,
        }
    }

    #[test]
    fn scope_defaults_to_all() {
        assert_eq!(
            parse_scope(&query(None, None, None)).expect("scope"),
            ExportScope::All
        );
    }

    #[test]
    fn page_scope_requires_page_number() {
        assert!(parse_scope(&query(Some("page"), None, None)).is_err());
        assert!(parse_scope(&query(Some("page"), Some(0), None)).is_err());
        assert_eq!(
            parse_scope(&query(Some("page"), Some(2), Some(25))).expect("scope"),
            ExportScope::Page {
                page: 2,
                per_page: 25
            }
        );
    }

    #[test]
    fn unknown_scope_is_rejected() {
        assert!(parse_scope(&query(Some("everything"), None, None)).is_err());
    }
}
