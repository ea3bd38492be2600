use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that requires a valid `Authorization: Bearer <jwt>` header.
///
/// Missing or non-Bearer credentials are rejected with 403, a token that fails
/// verification with 401. Verified claims are stored in the request extensions.
/// When no token authority is configured the middleware is a no-op.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(authority) = state.auth.as_ref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok());
    let claims = authority.authorize_header(auth_header)?;
    tracing::debug!(sub = %claims.sub, aud = %claims.aud, "request authorized");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
