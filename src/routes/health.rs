use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Liveness: no I/O
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness: the files root must be a reachable directory
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let root = state.config.files.root_dir.clone();
    let probe = tokio::fs::metadata(&root);
    match tokio::time::timeout(std::time::Duration::from_secs(5), probe).await {
        Ok(Ok(meta)) if meta.is_dir() => (StatusCode::OK, "ready").into_response(),
        Ok(Ok(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("not ready: {} is not a directory", root.display()),
        )
            .into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let body = format!(
        "# HELP atlas_files_listings_served Listings served\n# TYPE atlas_files_listings_served counter\natlas_files_listings_served {}\n\
# HELP atlas_files_files_listed Files returned by listings\n# TYPE atlas_files_files_listed counter\natlas_files_files_listed {}\n\
# HELP atlas_files_renames_succeeded Renames applied\n# TYPE atlas_files_renames_succeeded counter\natlas_files_renames_succeeded {}\n\
# HELP atlas_files_renames_failed Renames refused or failed\n# TYPE atlas_files_renames_failed counter\natlas_files_renames_failed {}\n\
# HELP atlas_files_moves_succeeded Moves applied\n# TYPE atlas_files_moves_succeeded counter\natlas_files_moves_succeeded {}\n\
# HELP atlas_files_moves_failed Moves refused or failed\n# TYPE atlas_files_moves_failed counter\natlas_files_moves_failed {}\n\
# HELP atlas_files_tokens_issued Tokens issued\n# TYPE atlas_files_tokens_issued counter\natlas_files_tokens_issued {}\n\
# HELP atlas_files_uptime_seconds Uptime seconds\n# TYPE atlas_files_uptime_seconds gauge\natlas_files_uptime_seconds {}\n",
        m.listings_served,
        m.files_listed,
        m.renames_succeeded,
        m.renames_failed,
        m.moves_succeeded,
        m.moves_failed,
        m.tokens_issued,
        m.uptime_seconds,
    );
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
