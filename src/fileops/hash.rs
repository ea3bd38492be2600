use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Upper bound on the read buffer, whatever `block_size` asks for.
pub const MAX_BUFFER: usize = 16 * 1024 * 1024;

/// Streaming BLAKE3 digest of a file, read in `block_size` chunks.
///
/// Returns `None` when the file cannot be opened or read (missing, permission
/// denied, a directory...). Callers treat that as "cannot verify".
/// The digest does not depend on `block_size`.
pub fn hash_file(path: &Path, block_size: u64) -> Option<String> {
    match try_hash_file(path, block_size) {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "hash unavailable");
            None
        }
    }
}

fn try_hash_file(path: &Path, block_size: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut buffer = vec![0u8; buffer_len(block_size, len)];
    let mut hasher = blake3::Hasher::new();

    loop {
        let count = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..count]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Read buffer size for a file of `len` bytes: `block_size`, shrunk to the
/// file length and to [`MAX_BUFFER`], never below 1.
pub(crate) fn buffer_len(block_size: u64, len: u64) -> usize {
    let chunk = block_size.clamp(1, len.max(1));
    usize::try_from(chunk).map_or(MAX_BUFFER, |chunk| chunk.min(MAX_BUFFER))
}
