//! The sequential acquisition driver.
//!
//! For each item: skip it if the ledger has it, otherwise acquire it, queue
//! the result for post-processing and record it. Acquisition failures go to
//! the error log and the batch continues.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::acquisition::{Acquirer, MediaItem};
use crate::ledger::{AppendLog, DedupLedger};
use crate::postprocess::{
    EmbeddedMetadata, JobMode, PostProcessJob, PostProcessQueue, TARGET_EXTENSION,
};

/// Counts for one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub successes: usize,
    pub failures: usize,
    /// Items already in the ledger.
    pub skipped: usize,
    /// Post-processing jobs enqueued.
    pub queued: usize,
}

/// Drives acquisition over a list of items.
pub struct Driver {
    acquirer: Acquirer,
    ledger: DedupLedger,
    error_log: AppendLog,
    queue: PostProcessQueue,
    output_dir: PathBuf,
    max_retries: u32,
    crf: u8,
}

impl Driver {
    pub fn new(
        acquirer: Acquirer,
        ledger: DedupLedger,
        error_log: AppendLog,
        queue: PostProcessQueue,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            acquirer,
            ledger,
            error_log,
            queue,
            output_dir: output_dir.into(),
            max_retries: 3,
            crf: 23,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Processes `items` in order. Never aborts on a single item.
    pub async fn run(&mut self, items: &[MediaItem]) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = items.len();

        for (index, item) in items.iter().enumerate() {
            let position = format!("{}/{}", index + 1, total);

            if self.ledger.contains(&item.id) {
                info!(
                    "({position}) Skipping already downloaded: {} [{}]",
                    item.display_title(),
                    item.id
                );
                summary.skipped += 1;
                continue;
            }

            info!(
                "({position}) Downloading: {} [{}]",
                item.display_title(),
                item.id
            );
            match self
                .acquirer
                .acquire(item, &self.output_dir, self.max_retries)
                .await
            {
                Some(path) => {
                    self.enqueue(item, &path);
                    summary.queued += 1;
                    if let Err(e) = self.ledger.record(&item.id).await {
                        error!(id = %item.id, error = %e, "Failed to record in ledger");
                    }
                    summary.successes += 1;
                }
                None => {
                    warn!("({position}) Download failed: {}", item.display_title());
                    if let Err(e) = self.error_log.append(&format!("Failed: {}", item.id)).await {
                        error!(error = %e, "Failed to write error log");
                    }
                    summary.failures += 1;
                }
            }
        }

        summary
    }

    fn enqueue(&self, item: &MediaItem, path: &Path) {
        let mode = if is_target_container(path) {
            JobMode::Remux
        } else {
            JobMode::Transcode { crf: self.crf }
        };
        info!(
            mode = %mode,
            "Queued for post-processing: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        self.queue.enqueue(
            PostProcessJob::new(path, mode)
                .with_output_dir(&self.output_dir)
                .with_metadata(EmbeddedMetadata::from_item(item)),
        );
    }
}

fn is_target_container(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(TARGET_EXTENSION))
}
