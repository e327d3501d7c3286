//! Types for the post-processing module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::acquisition::MediaItem;

/// Container every job produces.
pub const TARGET_EXTENSION: &str = "mp4";

/// What a job does to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum JobMode {
    /// Re-encode video at the given constant rate factor.
    Transcode { crf: u8 },
    /// Stream-copy into the target container.
    Remux,
}

impl JobMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transcode { .. } => "transcode",
            Self::Remux => "remux",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata written into the produced container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedMetadata {
    pub title: Option<String>,
    /// Written as artist, album artist and album.
    pub uploader: Option<String>,
    /// Written as date and release date.
    pub upload_date: Option<NaiveDate>,
    /// Written into the comment field.
    pub source_url: Option<String>,
}

impl EmbeddedMetadata {
    pub fn from_item(item: &MediaItem) -> Self {
        Self {
            title: item.title.clone(),
            uploader: item.uploader.clone(),
            upload_date: item.upload_date,
            source_url: item.url.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.uploader.is_none()
            && self.upload_date.is_none()
            && self.source_url.is_none()
    }

    /// Convert to ffmpeg metadata arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut pairs = Vec::new();

        if let Some(ref title) = self.title {
            pairs.push(format!("title={title}"));
        }
        if let Some(ref uploader) = self.uploader {
            pairs.push(format!("artist={uploader}"));
            pairs.push(format!("album_artist={uploader}"));
            pairs.push(format!("album={uploader}"));
        }
        if let Some(date) = self.upload_date {
            let date = date.format("%Y-%m-%d");
            pairs.push(format!("date={date}"));
            pairs.push(format!("release_date={date}"));
        }
        if let Some(ref url) = self.source_url {
            pairs.push(format!("comment=Source: {url}"));
        }

        pairs
            .into_iter()
            .flat_map(|pair| ["-metadata".to_string(), pair])
            .collect()
    }
}

/// Invoked once with the final path and whether the job succeeded.
pub type CompletionCallback = Box<dyn FnOnce(&Path, bool) + Send + Sync + 'static>;

/// One unit of post-processing work.
pub struct PostProcessJob {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub mode: JobMode,
    pub metadata: EmbeddedMetadata,
    on_complete: Option<CompletionCallback>,
}

impl PostProcessJob {
    /// Creates a job writing next to its source.
    pub fn new(source: impl Into<PathBuf>, mode: JobMode) -> Self {
        let source = source.into();
        let output_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            source,
            output_dir,
            mode,
            metadata: EmbeddedMetadata::default(),
            on_complete: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_metadata(mut self, metadata: EmbeddedMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl FnOnce(&Path, bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Detaches the completion callback so it can be run after logging.
    pub(crate) fn take_callback(&mut self) -> Option<CompletionCallback> {
        self.on_complete.take()
    }

    /// Where the job writes and where the result ends up.
    ///
    /// A source that already is the target container in the output
    /// directory is rewritten in place, whatever the case of its extension.
    pub fn plan_output(&self) -> OutputPlan {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.is_in_place() {
            return OutputPlan {
                write_to: self
                    .output_dir
                    .join(format!("{stem}.tmp.{TARGET_EXTENSION}")),
                final_path: self.source.clone(),
                replaces_source: true,
            };
        }

        let final_path = self.output_dir.join(format!("{stem}.{TARGET_EXTENSION}"));
        OutputPlan {
            write_to: final_path.clone(),
            final_path,
            replaces_source: false,
        }
    }

    fn is_in_place(&self) -> bool {
        self.source.parent() == Some(self.output_dir.as_path())
            && self
                .source
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION))
    }
}

impl fmt::Debug for PostProcessJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessJob")
            .field("source", &self.source)
            .field("output_dir", &self.output_dir)
            .field("mode", &self.mode)
            .field("metadata", &self.metadata)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

/// Output paths for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    /// Path the encoder writes to.
    pub write_to: PathBuf,
    /// Path the result has once the job succeeds.
    pub final_path: PathBuf,
    /// The result is renamed over the source instead of deleting it.
    pub replaces_source: bool,
}

/// Lifecycle of a job inside the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    /// Processing raised an error before an outcome was known.
    Errored,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Frame figures of the primary video stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamInfo {
    pub total_frames: Option<u64>,
    pub fps: Option<f64>,
    pub duration_secs: Option<f64>,
}

impl StreamInfo {
    /// Frame count, estimated from duration when the container lacks one.
    /// Zero means unknown.
    pub fn estimated_frames(&self, default_fps: f64) -> u64 {
        if let Some(frames) = self.total_frames.filter(|n| *n > 0) {
            return frames;
        }
        let fps = self.fps.unwrap_or(default_fps);
        match self.duration_secs {
            Some(duration) if duration.is_finite() && duration > 0.0 && fps > 0.0 => {
                (duration * fps) as u64
            }
            _ => 0,
        }
    }
}

/// Container-level tags reported by the probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerTags {
    tags: HashMap<String, String>,
}

impl ContainerTags {
    pub fn new(tags: HashMap<String, String>) -> Self {
        let tags = tags
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self { tags }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Whether both title and artist are present.
    pub fn is_tagged(&self) -> bool {
        self.get("title").is_some() && self.get("artist").is_some()
    }
}

/// Counters kept by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub succeeded: usize,
    pub failed: usize,
    pub errored: usize,
}

impl WorkerStats {
    pub(crate) fn record(&mut self, state: JobState) {
        match state {
            JobState::Succeeded => self.succeeded += 1,
            JobState::Failed => self.failed += 1,
            JobState::Errored => self.errored += 1,
            JobState::Queued | JobState::Running => {}
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.errored
    }
}
