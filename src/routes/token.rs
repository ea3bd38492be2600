use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    types::{TokenRequest, TokenResponse},
};

/// Issues a bearer token for an allow-listed platform/source pair.
///
/// Responds 201 with the token, 403 when the pair is not allowed, and 503
/// when the server runs without an `[auth]` section.
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let authority = state
        .auth
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("token issuance is not configured".into()))?;
    let Json(req) = payload?;

    let token = authority.issue(&req).inspect_err(|e| {
        tracing::warn!(platform = %req.source_platform, source = %req.source_id, "token refused: {}", e);
    })?;
    state.metrics.inc_tokens_issued();
    tracing::info!(platform = %req.source_platform, source = %req.source_id, "token issued");

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
