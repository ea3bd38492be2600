use std::thread;

use crate::config::FilesConfig;
use crate::types::{MoveRequest, Outcome, RenameRequest};

use super::{error_text, preflight, FileOperation};

pub const WORKER_FAILED: &str = "worker failed";

/// Batch engine for renames and moves.
///
/// Built once from configuration and shared read-only between requests.
/// A batch is cut into at most `thread_count` contiguous chunks, each handled
/// by its own worker thread; chunk results are joined back in chunk order so
/// that outcome `i` always answers request `i`.
#[derive(Debug, Clone)]
pub struct FileOps {
    block_size: u64,
    thread_count: usize,
}

impl FileOps {
    pub fn new(block_size: u64, thread_count: usize) -> Self {
        Self { block_size: block_size.max(1), thread_count: thread_count.max(1) }
    }

    pub fn from_config(files: &FilesConfig) -> Self {
        Self::new(files.block_size.as_u64(), files.effective_thread_count())
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn rename_all(&self, requests: Vec<RenameRequest>) -> Vec<Outcome<RenameRequest>> {
        self.run_batch(requests)
    }

    pub fn move_all(&self, requests: Vec<MoveRequest>) -> Vec<Outcome<MoveRequest>> {
        self.run_batch(requests)
    }

    /// `ceil(len / thread_count)`, never below 1.
    pub fn chunk_size(&self, len: usize) -> usize {
        len.div_ceil(self.thread_count).max(1)
    }

    /// Runs any [`FileOperation`] through preflight and apply. A worker that
    /// panics fails every request of its chunk with [`WORKER_FAILED`].
    pub(crate) fn run_batch<R: FileOperation>(&self, requests: Vec<R>) -> Vec<Outcome<R>> {
        if requests.is_empty() {
            return Vec::new();
        }
        let chunk_size = self.chunk_size(requests.len());
        let block_size = self.block_size;
        if chunk_size >= requests.len() {
            return process_chunk(&requests, block_size);
        }

        tracing::debug!(
            "{} batch of {} split into chunks of {}",
            R::VERB,
            requests.len(),
            chunk_size
        );
        thread::scope(|scope| {
            let workers: Vec<_> = requests
                .chunks(chunk_size)
                .map(|chunk| (chunk, scope.spawn(move || process_chunk(chunk, block_size))))
                .collect();

            let mut outcomes = Vec::with_capacity(requests.len());
            for (chunk, worker) in workers {
                match worker.join() {
                    Ok(chunk_outcomes) => outcomes.extend(chunk_outcomes),
                    Err(_) => {
                        tracing::error!("{} worker panicked; failing {} requests", R::VERB, chunk.len());
                        outcomes.extend(
                            chunk.iter().cloned().map(|req| Outcome::failed(req, WORKER_FAILED)),
                        );
                    }
                }
            }
            outcomes
        })
    }
}

fn process_chunk<R: FileOperation>(chunk: &[R], block_size: u64) -> Vec<Outcome<R>> {
    chunk.iter().map(|request| process_one(request, block_size)).collect()
}

fn process_one<R: FileOperation>(request: &R, block_size: u64) -> Outcome<R> {
    let verdict = preflight::check(request, block_size);
    if !verdict.passed {
        let reason = verdict.reason.unwrap_or_default();
        return Outcome::failed(request.clone(), reason);
    }

    let source = request.source();
    let destination = request.destination();
    match request.apply(&source, &destination) {
        Ok(()) => {
            tracing::info!("{}: \"{}\" -> \"{}\"", R::VERB, source.display(), destination.display());
            Outcome::succeeded(request.clone())
        }
        Err(e) => {
            let detail = error_text(&e);
            tracing::warn!(
                "Unable to {} \"{}\" into \"{}\": {}",
                R::VERB,
                source.display(),
                destination.display(),
                detail
            );
            Outcome::failed(request.clone(), detail)
        }
    }
}
