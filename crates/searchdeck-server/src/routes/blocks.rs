//! Layout edit commands: add, move, and remove report columns.
//!
//! Every handler rehydrates the layout from the persisted columns, applies
//! one command, and persists the result. Block ids are regenerated on every
//! rehydration, so handlers resolve a client-supplied id against the
//! persisted columns first and address the rehydrated layout by position;
//! responses always carry the full report so clients hold current ids.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use searchdeck_core::layout::Block;
use searchdeck_core::report::Report;

use crate::{error::AppError, routes::reports::load_report, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AddBlockRequest {
    pub block: Block,
    /// Slot index; omitted means append in a new slot at the end.
    pub position: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MoveBlockRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct RemoveBlockQuery {
    /// With `compact=true` the emptied slot is deleted and the tail shifts
    /// left; otherwise the slot is cleared in place.
    #[serde(default)]
    pub compact: bool,
}

async fn persist(state: &AppState, report: &Report) -> Result<(), AppError> {
    state.store.put_report(report).await.map_err(AppError::Internal)
}

/// `POST /api/reports/{id}/blocks` — place a block at a position, or append.
#[tracing::instrument(skip(state, body))]
pub async fn add_block(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
    Json(body): Json<AddBlockRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut report = load_report(&state, &report_id).await?;
    let mut layout = report.layout();

    match body.position {
        Some(position) => layout.insert_at(body.block, position)?,
        None => layout.append(body.block)?,
    };

    report.set_layout(&layout);
    persist(&state, &report).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// `POST /api/reports/{id}/blocks/move` — splice the slot at `from` back in
/// at `to`, shifting the slots in between.
#[tracing::instrument(skip(state))]
pub async fn move_block(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
    Json(body): Json<MoveBlockRequest>,
) -> Result<Json<Report>, AppError> {
    let mut report = load_report(&state, &report_id).await?;
    let mut layout = report.layout();

    if !layout.move_slot(body.from, body.to) {
        return Err(AppError::BadRequest(format!(
            "move positions {}..{} out of range for a {}-slot grid",
            body.from,
            body.to,
            layout.len()
        )));
    }

    report.set_layout(&layout);
    persist(&state, &report).await?;
    Ok(Json(report))
}

/// `DELETE /api/reports/{id}/blocks/{block_id}?compact=` — remove a block.
#[tracing::instrument(skip(state))]
pub async fn remove_block(
    State(state): State<Arc<AppState>>,
    Path((report_id, block_id)): Path<(String, String)>,
    Query(query): Query<RemoveBlockQuery>,
) -> Result<Json<Report>, AppError> {
    let mut report = load_report(&state, &report_id).await?;

    // The client addresses the id from the last persisted generation;
    // translate it to a position before ids are regenerated.
    let position = report
        .columns
        .iter()
        .position(|column| column.as_ref().is_some_and(|block| block.id() == block_id))
        .ok_or_else(|| AppError::NotFound(format!("block {block_id} not found")))?;

    let mut layout = report.layout();
    let current_id = layout
        .get(position)
        .map(|block| block.id().to_string())
        .ok_or_else(|| AppError::NotFound(format!("block {block_id} not found")))?;
    layout.remove(&current_id, query.compact);

    report.set_layout(&layout);
    persist(&state, &report).await?;
    Ok(Json(report))
}
