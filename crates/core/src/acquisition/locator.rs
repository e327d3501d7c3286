//! Resolution of acquired files on disk.
//!
//! Media files embed their identifier in a bracket token, as in
//! `Some Title [abcdefgh123].mp4`, and carry an adjacent `.jpg` thumbnail
//! with the same stem. Both the retry engine and the reconciliation scanner
//! rely on this layout.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

/// Extension of the thumbnail written next to each media file.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

static IDENTIFIER_TOKEN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z0-9_-]{8,})\]").ok());

/// Finds the file produced for `identifier` in `output_dir`.
///
/// Only immediate regular files whose name contains ` [<identifier>].` are
/// candidates, excluding thumbnails and in-progress partials. When several
/// match, the most recently modified wins.
pub async fn locate(output_dir: &Path, identifier: &str) -> Option<PathBuf> {
    let needle = format!(" [{identifier}].");

    let mut entries = match fs::read_dir(output_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %output_dir.display(), error = %e, "Cannot list output directory");
            return None;
        }
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.contains(&needle) || is_sidecar(&name) {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
            newest = Some((modified, entry.path()));
        }
    }

    newest.map(|(_, path)| path)
}

/// Thumbnails and partial downloads share the media file's stem.
fn is_sidecar(name: &str) -> bool {
    let name = name.to_lowercase();
    [".jpg", ".webp", ".part", ".ytdl"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Extracts the bracketed identifier from a file name.
pub fn extract_identifier(file_name: &str) -> Option<&str> {
    IDENTIFIER_TOKEN
        .as_ref()?
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Path of the thumbnail that belongs to `media`.
pub fn thumbnail_path(media: &Path) -> PathBuf {
    media.with_extension(THUMBNAIL_EXTENSION)
}
