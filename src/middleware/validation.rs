use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::routes::MAX_BODY_BYTES;

/// Rejects requests whose URI path tries to escape the route tree, and
/// oversized bodies on write methods before they are read.
///
/// `DefaultBodyLimit` still enforces the limit for chunked bodies that carry
/// no `Content-Length`.
pub async fn validate_request_middleware(req: Request, next: Next) -> Response {
    if contains_path_traversal(req.uri().path()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_PATH",
                    "message": "Path traversal detected in request",
                },
                "status": 400,
            })),
        )
            .into_response();
    }

    if matches!(req.method(), &Method::POST | &Method::PUT | &Method::PATCH) {
        let declared = req
            .headers()
            .get(axum::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if let Some(length) = declared {
            if length > MAX_BODY_BYTES {
                tracing::warn!(length, limit = MAX_BODY_BYTES, "request body too large");
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({
                        "error": {
                            "code": "PAYLOAD_TOO_LARGE",
                            "message": format!("Request body exceeds maximum size of {} bytes", MAX_BODY_BYTES),
                        },
                        "status": 413,
                    })),
                )
                    .into_response();
            }
        }
    }

    next.run(req).await
}

/// Detects `..` segments and their percent-encoded forms in a request path.
pub(crate) fn contains_path_traversal(path: &str) -> bool {
    if path.contains('\0') {
        return true;
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return true;
    }

    let lower = path.to_ascii_lowercase();
    ["%2e%2e", "%252e%252e", "%2e.", ".%2e", "%00"].iter().any(|p| lower.contains(p))
}
