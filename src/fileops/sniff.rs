//! Content-based MIME detection.
//!
//! Only the leading bytes of a file are inspected. The table covers the video
//! containers a media library is expected to hold plus a plain-text fallback,
//! which is what subtitle files usually sniff as.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

const FTYP: &[u8; 4] = b"ftyp";
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const FLV_MAGIC: &[u8; 3] = b"FLV";
const MPEG_PS_MAGIC: [u8; 4] = [0x00, 0x00, 0x01, 0xBA];
const MPEG_VIDEO_MAGIC: [u8; 4] = [0x00, 0x00, 0x01, 0xB3];
const ASF_MAGIC: [u8; 8] = [0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11];
const OGG_MAGIC: &[u8; 4] = b"OggS";
const TS_SYNC: u8 = 0x47;
const TS_PACKET_LEN: usize = 188;
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Sniffs the MIME type of the file at `path`.
///
/// `Ok(None)` means the file is empty.
pub fn sniff_mime(path: &Path) -> io::Result<Option<&'static str>> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(detect(&head))
}

/// Detects a MIME type from the leading bytes of a file.
pub fn detect(bytes: &[u8]) -> Option<&'static str> {
    if bytes.is_empty() {
        return None;
    }
    if bytes.len() >= 12 && &bytes[4..8] == FTYP {
        return Some(iso_media_type(&bytes[8..12]));
    }
    if bytes.starts_with(&EBML_MAGIC) {
        return Some(if contains(bytes, b"webm") { "video/webm" } else { "video/x-matroska" });
    }
    if bytes.len() >= 12 && bytes.starts_with(RIFF_MAGIC) {
        return Some(match &bytes[8..12] {
            b"AVI " => "video/x-msvideo",
            b"WAVE" => "audio/x-wav",
            b"WEBP" => "image/webp",
            _ => "application/octet-stream",
        });
    }
    if bytes.starts_with(FLV_MAGIC) {
        return Some("video/x-flv");
    }
    if bytes.starts_with(&MPEG_PS_MAGIC) || bytes.starts_with(&MPEG_VIDEO_MAGIC) {
        return Some("video/mpeg");
    }
    if bytes.starts_with(&ASF_MAGIC) {
        return Some("video/x-ms-asf");
    }
    if bytes.starts_with(OGG_MAGIC) {
        let is_video = contains(bytes, b"\x80theora") || contains(bytes, b"\x01video");
        return Some(if is_video { "video/ogg" } else { "audio/ogg" });
    }
    if is_transport_stream(bytes) {
        return Some("video/mp2t");
    }
    if bytes.starts_with(&UTF16_LE_BOM) || bytes.starts_with(&UTF16_BE_BOM) || is_text(bytes) {
        return Some("text/plain");
    }
    Some("application/octet-stream")
}

/// ISO base media files (`ftyp` box) are told apart by their major brand.
fn iso_media_type(brand: &[u8]) -> &'static str {
    match brand {
        b"qt  " => "video/quicktime",
        b"M4A " | b"M4B " | b"M4P " => "audio/mp4",
        b"avif" | b"avis" => "image/avif",
        b"heic" | b"heix" | b"mif1" | b"msf1" => "image/heic",
        b"crx " => "image/x-canon-cr3",
        _ if brand.starts_with(b"3g2") => "video/3gpp2",
        _ if brand.starts_with(b"3gp") => "video/3gpp",
        _ if brand.starts_with(b"M4V") => "video/x-m4v",
        _ => "video/mp4",
    }
}

fn is_transport_stream(bytes: &[u8]) -> bool {
    bytes.first() == Some(&TS_SYNC)
        && bytes.len() > TS_PACKET_LEN
        && bytes[TS_PACKET_LEN] == TS_SYNC
}

fn is_text(bytes: &[u8]) -> bool {
    let valid = match std::str::from_utf8(bytes) {
        Ok(_) => true,
        // A multi-byte character cut off by the sniff window is still text.
        Err(e) => e.error_len().is_none() && e.valid_up_to() > 0,
    };
    valid
        && bytes
            .iter()
            .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
