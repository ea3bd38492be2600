//! Middleware components for HTTP request processing.
//!
//! Bearer-token authorization for the `/files` endpoints, early request
//! validation, and response security headers.

pub mod auth;
pub mod security_headers;
pub mod validation;
