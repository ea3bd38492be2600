//! HTTP route handlers and router assembly.
//!
//! - `files`: listing and the batch rename/move endpoints
//! - `health`: liveness, readiness, metrics and build info
//! - `token`: API token issuance

pub mod files;
pub mod health;
pub mod token;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware;
use crate::state::AppState;

/// Upper bound on request bodies. A batch of `max_batch_size` descriptors fits
/// comfortably within it.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Builds the application router with all middleware applied.
///
/// The `/files` endpoints sit behind bearer authorization when an `[auth]`
/// section is configured; health, metrics, version and `/token` are open.
pub fn router(state: AppState) -> Router {
    let cfg = state.config.clone();

    let files = Router::new()
        .route("/list", get(files::list_files))
        .route("/rename", patch(files::rename_files))
        .route("/move", patch(files::move_files))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth::require_bearer));

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/token", post(token::issue_token))
        .nest("/files", files)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(middleware::validation::validate_request_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg, middleware::security_headers::security_headers_middleware))
}
