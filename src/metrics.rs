use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::types::Outcome;

/// Operation counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub listings_served: Arc<AtomicU64>,
    pub files_listed: Arc<AtomicU64>,
    pub renames_succeeded: Arc<AtomicU64>,
    pub renames_failed: Arc<AtomicU64>,
    pub moves_succeeded: Arc<AtomicU64>,
    pub moves_failed: Arc<AtomicU64>,
    pub tokens_issued: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            listings_served: Arc::new(AtomicU64::new(0)),
            files_listed: Arc::new(AtomicU64::new(0)),
            renames_succeeded: Arc::new(AtomicU64::new(0)),
            renames_failed: Arc::new(AtomicU64::new(0)),
            moves_succeeded: Arc::new(AtomicU64::new(0)),
            moves_failed: Arc::new(AtomicU64::new(0)),
            tokens_issued: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_listing(&self, files: usize) {
        self.listings_served.fetch_add(1, Ordering::Relaxed);
        self.files_listed.fetch_add(files as u64, Ordering::Relaxed);
    }

    pub fn record_renames<R>(&self, outcomes: &[Outcome<R>]) {
        let (ok, failed) = tally(outcomes);
        self.renames_succeeded.fetch_add(ok, Ordering::Relaxed);
        self.renames_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_moves<R>(&self, outcomes: &[Outcome<R>]) {
        let (ok, failed) = tally(outcomes);
        self.moves_succeeded.fetch_add(ok, Ordering::Relaxed);
        self.moves_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn inc_tokens_issued(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            listings_served: self.listings_served.load(Ordering::Relaxed),
            files_listed: self.files_listed.load(Ordering::Relaxed),
            renames_succeeded: self.renames_succeeded.load(Ordering::Relaxed),
            renames_failed: self.renames_failed.load(Ordering::Relaxed),
            moves_succeeded: self.moves_succeeded.load(Ordering::Relaxed),
            moves_failed: self.moves_failed.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn tally<R>(outcomes: &[Outcome<R>]) -> (u64, u64) {
    let ok = outcomes.iter().filter(|o| o.success).count() as u64;
    (ok, outcomes.len() as u64 - ok)
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub listings_served: u64,
    pub files_listed: u64,
    pub renames_succeeded: u64,
    pub renames_failed: u64,
    pub moves_succeeded: u64,
    pub moves_failed: u64,
    pub tokens_issued: u64,
    pub uptime_seconds: u64,
}
