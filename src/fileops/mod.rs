//! File operations: content hashing, MIME sniffing, preflight checks and the
//! batch engine that applies renames and moves.
//!
//! Rename and move share one pipeline through the [`FileOperation`] trait:
//! resolve source and destination, run the preflight chain, then mutate.

pub mod batch;
pub mod hash;
pub mod preflight;
pub mod sniff;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{FileDescriptor, MoveRequest, RenameRequest};

pub use batch::FileOps;
pub use hash::hash_file;
pub use preflight::{check, PreflightResult};

/// A mutating request that can be preflighted and applied by the batch engine.
pub trait FileOperation: Clone + Send + Sync {
    /// Reported when source and destination resolve to the same path.
    const NOOP_REASON: &'static str;
    /// Verb used in log lines.
    const VERB: &'static str;

    fn descriptor(&self) -> &FileDescriptor;

    fn destination(&self) -> PathBuf;

    /// Performs the mutation once preflight has passed.
    fn apply(&self, source: &Path, destination: &Path) -> io::Result<()>;

    fn source(&self) -> PathBuf {
        let file = self.descriptor();
        Path::new(&file.path).join(&file.name)
    }
}

impl FileOperation for RenameRequest {
    const NOOP_REASON: &'static str = "name unchanged";
    const VERB: &'static str = "rename";

    fn descriptor(&self) -> &FileDescriptor {
        &self.file
    }

    fn destination(&self) -> PathBuf {
        Path::new(&self.file.path).join(&self.new_name)
    }

    fn apply(&self, source: &Path, destination: &Path) -> io::Result<()> {
        ensure_vacant(destination)?;
        fs::rename(source, destination)
    }
}

impl FileOperation for MoveRequest {
    const NOOP_REASON: &'static str = "path unchanged";
    const VERB: &'static str = "move";

    fn descriptor(&self) -> &FileDescriptor {
        &self.file
    }

    fn destination(&self) -> PathBuf {
        Path::new(&self.new_destination_path).join(&self.file.name)
    }

    fn apply(&self, source: &Path, destination: &Path) -> io::Result<()> {
        ensure_vacant(destination)?;
        move_file(source, destination)
    }
}

fn ensure_vacant(destination: &Path) -> io::Result<()> {
    // symlink_metadata so a dangling link still counts as occupied
    if fs::symlink_metadata(destination).is_ok() {
        return Err(io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"));
    }
    Ok(())
}

/// Renames `source` to `destination`, falling back to copy + delete when the
/// two paths live on different filesystems. Timestamps survive the fallback.
pub fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device(&err) => {
            tracing::info!(
                "Rename across filesystems for {} ({}), falling back to copy",
                source.display(),
                err
            );
            let src_meta = fs::metadata(source)?;
            if let Err(copy_err) = fs::copy(source, destination) {
                let _ = fs::remove_file(destination);
                return Err(copy_err);
            }
            let atime = filetime::FileTime::from_last_access_time(&src_meta);
            let mtime = filetime::FileTime::from_last_modification_time(&src_meta);
            if let Err(e) = filetime::set_file_times(destination, atime, mtime) {
                tracing::warn!(path = %destination.display(), error = %e, "failed to preserve timestamps");
            }
            fs::remove_file(source)
        }
        Err(err) => Err(err),
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV on Unix, ERROR_NOT_SAME_DEVICE on Windows
    match err.raw_os_error() {
        #[cfg(unix)]
        Some(18) => true,
        #[cfg(windows)]
        Some(17) => true,
        _ => false,
    }
}

/// OS error text without the trailing `(os error N)` suffix.
pub fn error_text(err: &io::Error) -> String {
    let text = err.to_string();
    match err.raw_os_error() {
        Some(code) => text
            .strip_suffix(&format!(" (os error {})", code))
            .map(str::to_string)
            .unwrap_or(text),
        None => text,
    }
}
