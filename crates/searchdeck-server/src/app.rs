use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — permissive by default, restricted to the configured
///    origins when `SEARCHDECK_CORS_ORIGINS` is set.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/properties/{property}/reports",
            get(routes::reports::list_reports).post(routes::reports::create_report),
        )
        .route(
            "/api/reports/{id}",
            get(routes::reports::get_report).delete(routes::reports::delete_report),
        )
        .route("/api/reports/{id}/blocks", post(routes::blocks::add_block))
        .route(
            "/api/reports/{id}/blocks/move",
            post(routes::blocks::move_block),
        )
        .route(
            "/api/reports/{id}/blocks/{block_id}",
            delete(routes::blocks::remove_block),
        )
        .route(
            "/api/reports/{id}/refresh",
            post(routes::reports::refresh_report),
        )
        .route(
            "/api/reports/{id}/export",
            get(routes::export::export_report),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
