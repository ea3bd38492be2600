use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use tokio::task::spawn_blocking;

use crate::{
    error::{
        validation::{validate_batch_size, validate_file_name, validate_path},
        AppResult,
    },
    scanner::{self, ScanOptions},
    state::AppState,
    types::{FileBatch, FileDescriptor, ListQuery, MoveRequest, Outcome, RenameRequest},
};

pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<FileBatch<FileDescriptor>>> {
    let files_cfg = &state.config.files;
    let root = files_cfg.root_dir.clone();
    let options = ScanOptions::from_config(files_cfg, query.subtitles, query.hashes);

    let files = spawn_blocking(move || scanner::scan(&root, &options)).await??;
    tracing::info!(
        count = files.len(),
        subtitles = query.subtitles,
        hashes = query.hashes,
        "listed media files"
    );
    state.metrics.record_listing(files.len());

    Ok(Json(FileBatch { files }))
}

pub async fn rename_files(
    State(state): State<AppState>,
    payload: Result<Json<FileBatch<RenameRequest>>, JsonRejection>,
) -> AppResult<Json<FileBatch<Outcome<RenameRequest>>>> {
    let Json(batch) = payload?;
    validate_batch_size(batch.files.len(), state.config.files.max_batch_size)?;
    for (i, req) in batch.files.iter().enumerate() {
        validate_descriptor(i, &req.file)?;
        validate_file_name(&format!("files[{}].new_name", i), &req.new_name)?;
    }

    let engine = state.files.clone();
    let outcomes = spawn_blocking(move || engine.rename_all(batch.files)).await?;
    state.metrics.record_renames(&outcomes);
    log_batch("rename", &outcomes);

    Ok(Json(FileBatch { files: outcomes }))
}

pub async fn move_files(
    State(state): State<AppState>,
    payload: Result<Json<FileBatch<MoveRequest>>, JsonRejection>,
) -> AppResult<Json<FileBatch<Outcome<MoveRequest>>>> {
    let Json(batch) = payload?;
    validate_batch_size(batch.files.len(), state.config.files.max_batch_size)?;
    for (i, req) in batch.files.iter().enumerate() {
        validate_descriptor(i, &req.file)?;
        validate_path(&format!("files[{}].new_destination_path", i), &req.new_destination_path)?;
    }

    let engine = state.files.clone();
    let outcomes = spawn_blocking(move || engine.move_all(batch.files)).await?;
    state.metrics.record_moves(&outcomes);
    log_batch("move", &outcomes);

    Ok(Json(FileBatch { files: outcomes }))
}

fn validate_descriptor(index: usize, file: &FileDescriptor) -> AppResult<()> {
    validate_file_name(&format!("files[{}].name", index), &file.name)?;
    validate_path(&format!("files[{}].path", index), &file.path)
}

fn log_batch<R>(verb: &str, outcomes: &[Outcome<R>]) {
    let failed = outcomes.iter().filter(|o| !o.success).count();
    tracing::info!(verb, total = outcomes.len(), failed, "batch completed");
}
