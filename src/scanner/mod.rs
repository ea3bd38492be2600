//! Media file discovery under the configured root directory.

use std::path::Path;

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::FilesConfig;
use crate::fileops::{hash_file, sniff};
use crate::types::FileDescriptor;

/// Extensions listed alongside videos when subtitles are requested.
pub const SUBTITLE_EXTENSIONS: [&str; 5] = ["srt", "smi", "ssa", "ass", "vtt"];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub include_subtitles: bool,
    pub calculate_hashes: bool,
    pub block_size: u64,
    /// When unset, directory symlinks are not descended but symlinks to
    /// regular files are still listed. When set, loops are detected and skipped.
    pub follow_symlinks: bool,
    pub excludes: Vec<String>,
}

impl ScanOptions {
    pub fn from_config(files: &FilesConfig, include_subtitles: bool, calculate_hashes: bool) -> Self {
        Self {
            include_subtitles,
            calculate_hashes,
            block_size: files.block_size.as_u64(),
            follow_symlinks: files.follow_symlinks,
            excludes: files.excludes.clone(),
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_subtitles: false,
            calculate_hashes: false,
            block_size: 128 * 1024 * 1024,
            follow_symlinks: false,
            excludes: vec![],
        }
    }
}

/// Walks `root` recursively and returns a descriptor for every video file,
/// plus subtitle files when `include_subtitles` is set.
///
/// Videos are recognised by content, subtitles by extension. Entries that
/// cannot be read are logged and skipped; the order of the result is
/// unspecified.
pub fn scan(root: &Path, options: &ScanOptions) -> anyhow::Result<Vec<FileDescriptor>> {
    let excludes = build_globset(&options.excludes)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|e| !matches_excludes(e.path(), &excludes));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                if let Some(ancestor) = e.loop_ancestor() {
                    tracing::warn!(
                        "Symlink loop skipped: {} -> {}",
                        e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                        ancestor.display()
                    );
                } else {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                }
                continue;
            }
        };
        let path = entry.path();
        let file_type = entry.file_type();
        let metadata = if file_type.is_file() {
            entry.metadata().map_err(anyhow::Error::from)
        } else if file_type.is_symlink() {
            // Unfollowed link: listed when it resolves to a regular file
            match std::fs::metadata(path) {
                Ok(m) if m.is_file() => Ok(m),
                Ok(_) => continue,
                Err(e) => Err(e.into()),
            }
        } else {
            continue;
        };
        let metadata = match metadata {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Failed to stat {}: {}", path.display(), e);
                continue;
            }
        };

        let mime_type = match sniff::sniff_mime(path) {
            Ok(mime) => mime,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "content type unavailable");
                None
            }
        };
        let is_video = mime_type.is_some_and(|m| m.starts_with("video/"));
        if !(is_video || (options.include_subtitles && is_subtitle(path))) {
            continue;
        }

        let (Some(name), Some(parent)) = (
            entry.file_name().to_str(),
            path.parent().and_then(|p| p.to_str()),
        ) else {
            tracing::warn!("Skipping file with a non UTF-8 path: {}", path.display());
            continue;
        };
        files.push(FileDescriptor {
            name: name.to_string(),
            path: parent.to_string(),
            hash: if options.calculate_hashes { hash_file(path, options.block_size) } else { None },
            size: Some(metadata.len()),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            mime_type: mime_type.map(str::to_string),
        });
    }

    tracing::debug!("Scan of {} found {} files", root.display(), files.len());
    Ok(files)
}

pub fn is_subtitle(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUBTITLE_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        if p.trim().is_empty() {
            continue;
        }
        // Patterns and paths are both compared with forward slashes.
        let norm = p.trim().replace('\\', "/");
        b.add(Glob::new(&norm)?);
    }
    Ok(b.build()?)
}

fn matches_excludes(path: &Path, set: &GlobSet) -> bool {
    if set.is_empty() {
        return false;
    }
    let s = path.to_string_lossy().replace('\\', "/");
    set.is_match(&s)
}
