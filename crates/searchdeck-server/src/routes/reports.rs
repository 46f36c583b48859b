use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use searchdeck_core::report::{CreateReportRequest, Report, ReportSummary};

use crate::{error::AppError, pipeline, state::AppState};

/// Load a report or fail with 404.
pub(crate) async fn load_report(state: &AppState, report_id: &str) -> Result<Report, AppError> {
    state
        .store
        .get_report(report_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("report {report_id} not found")))
}

/// `GET /api/properties/{property}/reports` — summaries for one property.
#[tracing::instrument(skip(state))]
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Path(property): Path<String>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let summaries = state
        .store
        .list_reports(&property)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(summaries))
}

/// `POST /api/properties/{property}/reports` — create a named, empty report
/// with the minimum visible grid and no rows.
#[tracing::instrument(skip(state, body))]
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    Path(property): Path<String>,
    Json(body): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("report name must not be empty".to_string()));
    }

    let report = Report::new(&property, name);
    state
        .store
        .put_report(&report)
        .await
        .map_err(AppError::Internal)?;
    tracing::info!(report_id = %report.id, property = %property, "Report created");
    Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /api/reports/{id}` — the full report document.
#[tracing::instrument(skip(state))]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(load_report(&state, &report_id).await?))
}

/// `DELETE /api/reports/{id}`.
#[tracing::instrument(skip(state))]
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .store
        .delete_report(&report_id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound(format!("report {report_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/reports/{id}/refresh` — run the fetch-reconcile-annotate cycle
/// and persist its outcome as the report's new row snapshot. The snapshot is
/// replaced wholesale; a failed cycle leaves the previous rows untouched.
#[tracing::instrument(skip(state))]
pub async fn refresh_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Result<Json<Report>, AppError> {
    let mut report = load_report(&state, &report_id).await?;

    let rows = pipeline::refresh_rows(
        Arc::clone(&state.search),
        Arc::clone(&state.intents),
        &report.property,
        &report.layout(),
        state.config.row_limit,
    )
    .await?;

    tracing::info!(report_id = %report.id, rows = rows.len(), "Refresh cycle complete");
    report.rows = rows;
    report.last_fetched_at = Some(chrono::Utc::now().to_rfc3339());
    report.touch();
    state
        .store
        .put_report(&report)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(report))
}
