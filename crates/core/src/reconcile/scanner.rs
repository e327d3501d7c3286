use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::acquisition::{extract_identifier, thumbnail_path};
use crate::catalog::MetadataLookup;
use crate::postprocess::{
    EmbeddedMetadata, JobMode, MediaTool, PostProcessJob, PostProcessQueue, TARGET_EXTENSION,
};

/// Suffixes of artifacts an interrupted run leaves behind.
pub const LEFTOVER_SUFFIXES: &[&str] = &[".part", ".ytdl", ".tmp.mp4"];

/// Containers that are always transcoded.
pub const INTERMEDIATE_EXTENSIONS: &[&str] = &["webm", "mkv"];

/// What a scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Leftover artifacts deleted.
    pub removed: usize,
    /// Jobs enqueued.
    pub queued: usize,
    /// Finalized files that already carried their tags.
    pub already_tagged: usize,
}

/// Re-enqueues work a previous run did not finish.
pub struct ReconcileScanner {
    tool: Arc<dyn MediaTool>,
    lookup: Arc<dyn MetadataLookup>,
}

impl ReconcileScanner {
    pub fn new(tool: Arc<dyn MediaTool>, lookup: Arc<dyn MetadataLookup>) -> Self {
        Self { tool, lookup }
    }

    /// Scans `output_dir` once.
    ///
    /// Leftovers are deleted first. Intermediate containers are queued for
    /// transcoding at `crf`. Finalized containers with an adjacent thumbnail
    /// are queued for remuxing unless they already carry title and artist
    /// tags.
    pub async fn scan(
        &self,
        output_dir: &Path,
        queue: &PostProcessQueue,
        crf: u8,
    ) -> std::io::Result<ScanReport> {
        let mut report = ScanReport::default();

        for path in list_files(output_dir).await? {
            if is_leftover(&path) {
                match fs::remove_file(&path).await {
                    Ok(()) => {
                        debug!(path = %path.display(), "Removed leftover");
                        report.removed += 1;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove leftover"),
                }
            }
        }

        for path in list_files(output_dir).await? {
            let Some(ext) = extension(&path) else {
                continue;
            };

            let mode = if INTERMEDIATE_EXTENSIONS.contains(&ext.as_str()) {
                JobMode::Transcode { crf }
            } else if ext == TARGET_EXTENSION {
                if !fs::try_exists(thumbnail_path(&path)).await.unwrap_or(false) {
                    continue;
                }
                if !self.needs_tags(&path).await {
                    debug!(path = %path.display(), "Already tagged, skipping");
                    report.already_tagged += 1;
                    continue;
                }
                JobMode::Remux
            } else {
                continue;
            };

            let metadata = self.metadata_for(&path).await;
            queue.enqueue(
                PostProcessJob::new(&path, mode)
                    .with_output_dir(output_dir)
                    .with_metadata(metadata),
            );
            report.queued += 1;
        }

        info!(
            dir = %output_dir.display(),
            removed = report.removed,
            queued = report.queued,
            already_tagged = report.already_tagged,
            "Reconciliation scan finished"
        );
        Ok(report)
    }

    async fn needs_tags(&self, path: &Path) -> bool {
        self.tool
            .probe_tags(path)
            .await
            .map(|tags| !tags.is_tagged())
            .unwrap_or(true)
    }

    async fn metadata_for(&self, path: &Path) -> EmbeddedMetadata {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(id) = extract_identifier(&name) else {
            return EmbeddedMetadata::default();
        };

        match self.lookup.lookup(id).await {
            Ok(item) => EmbeddedMetadata::from_item(&item),
            Err(e) => {
                debug!(id, error = %e, "Metadata lookup failed, continuing without it");
                EmbeddedMetadata::default()
            }
        }
    }
}

/// Immediate regular files in `dir`, sorted by name.
async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_leftover(path: &Path) -> bool {
    let name = path.to_string_lossy().to_lowercase();
    LEFTOVER_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}
