//! # Atlas Files Library
//!
//! Core library for the Atlas files API, a small HTTP service for bulk
//! server-side file operations (list, rename, move) over a media library.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: HTTP server and routing
//! - **Tokio**: Async runtime; blocking filesystem work runs on `spawn_blocking`
//! - **Serde**: JSON (de)serialization of descriptors and outcomes
//! - **BLAKE3**: Streaming content digests
//!
//! ## Core Components
//!
//! - [`auth`]: JWT issuance and verification
//! - [`config`]: Application configuration management
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`fileops`]: Hashing, content sniffing, preflight checks and the batch engine
//! - [`logging`]: Tracing subscriber setup
//! - [`metrics`]: Operation counters
//! - [`middleware`]: HTTP middleware for auth, security headers and validation
//! - [`routes`]: HTTP API endpoint handlers and the router
//! - [`scanner`]: Media file discovery
//! - [`state`]: Shared application state
//! - [`types`]: Data transfer objects
//!
//! ## Guarantees
//!
//! - Every rename/move request yields exactly one outcome, in request order
//! - A caller's snapshot (size, hash, mtime) is verified before any mutation
//! - Per-file failures are reported as data, never as HTTP errors

pub mod auth;
pub mod config;
pub mod error;
pub mod fileops;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod scanner;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
