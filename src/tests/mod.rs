//! Integration and unit tests for the Atlas files service.
//!
//! ## Test Modules
//!
//! - **fixtures**: Shared helpers for building media trees on disk
//! - **hash_tests**: Streaming digest behavior
//! - **sniff_tests**: Content-based MIME detection
//! - **preflight_tests**: Snapshot verification before rename/move
//! - **batch_tests**: The parallel batch engine
//! - **scanner_tests**: Media file discovery
//! - **auth_tests**: Token issuance and verification
//! - **api_tests**: HTTP endpoints through the full router
//! - **error_tests**: Error responses and request validation
//! - **config_tests**: Configuration loading and validation
//!
//! Individual test modules can be run with:
//! ```bash
//! cargo test batch_tests
//! ```


pub mod api_tests;
pub mod config_tests;
