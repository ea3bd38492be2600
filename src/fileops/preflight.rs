use std::fs;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::{hash::hash_file, FileOperation};

pub const SOURCE_INACCESSIBLE: &str = "source file inaccessible";
pub const HASH_MISMATCH: &str = "hash mismatch";

/// Verdict of [`check`]. `reason` is set exactly when `passed` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightResult {
    pub passed: bool,
    pub reason: Option<String>,
}

impl PreflightResult {
    pub fn pass() -> Self {
        Self { passed: true, reason: None }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self { passed: false, reason: Some(reason.into()) }
    }
}

/// Verifies that the caller's snapshot of a file still matches the filesystem
/// before a rename or move is allowed.
///
/// Checks run in a fixed order and stop at the first failure:
///
/// 1. source and destination differ
/// 2. the source can be read (its live digest is computed)
/// 3. size, when claimed
/// 4. hash, when claimed
/// 5. modification time, when claimed
pub fn check<R: FileOperation>(request: &R, block_size: u64) -> PreflightResult {
    let file = request.descriptor();
    let source = request.source();
    let destination = request.destination();

    if source == destination {
        tracing::debug!("\"{}\": {}", source.display(), R::NOOP_REASON);
        return PreflightResult::fail(R::NOOP_REASON);
    }

    let failed = |reason: String| {
        tracing::warn!("\"{}\": {}", source.display(), reason);
        PreflightResult::fail(reason)
    };

    let Some(live_hash) = hash_file(&source, block_size) else {
        return failed(SOURCE_INACCESSIBLE.to_string());
    };
    let metadata = match fs::metadata(&source) {
        Ok(m) => m,
        Err(_) => return failed(SOURCE_INACCESSIBLE.to_string()),
    };

    if let Some(claimed) = file.size {
        let live = metadata.len();
        if live != claimed {
            return failed(format!("size mismatch (delta: {})", live.abs_diff(claimed)));
        }
    }

    if let Some(claimed) = file.hash.as_deref() {
        if !claimed.eq_ignore_ascii_case(&live_hash) {
            return failed(HASH_MISMATCH.to_string());
        }
    }

    if let Some(claimed) = file.modified_at {
        let Ok(modified) = metadata.modified() else {
            return failed(SOURCE_INACCESSIBLE.to_string());
        };
        let live = DateTime::<Utc>::from(modified);
        if live != claimed {
            return failed(format!(
                "modification time mismatch (delta: {})",
                format_delta(live - claimed)
            ));
        }
    }

    PreflightResult::pass()
}

/// Renders the absolute value of `delta` as seconds with millisecond
/// precision, or in nanoseconds when it is below one millisecond.
pub fn format_delta(delta: TimeDelta) -> String {
    let delta = delta.abs();
    if delta < TimeDelta::milliseconds(1) {
        return format!("{}ns", delta.num_nanoseconds().unwrap_or(0));
    }
    format!("{}.{:03}s", delta.num_seconds(), delta.subsec_nanos() / 1_000_000)
}
