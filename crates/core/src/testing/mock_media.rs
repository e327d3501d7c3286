//! Mock media tool for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::postprocess::{
    ContainerTags, MediaTool, PostProcessError, StatusLineSink, StreamInfo,
};

/// Mock implementation of the MediaTool trait.
///
/// Provides controllable behavior for testing:
/// - Record every encode invocation's arguments
/// - Simulate success, failure, errors and panics
/// - Control probe results per path
/// - Emit status lines to the progress callback
///
/// On success the encoder writes a small file at its last argument, which
/// is where ffmpeg would write its output.
///
/// # Example
///
/// ```rust,ignore
/// use vidfetch_core::testing::MockMediaTool;
///
/// let tool = MockMediaTool::new();
/// tool.set_exit_success(false).await;
///
/// // ... run a worker ...
///
/// assert_eq!(tool.encode_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockMediaTool {
    /// Arguments of every encode call.
    runs: Arc<RwLock<Vec<Vec<String>>>>,
    /// Stream probe result. `None` makes the probe fail.
    stream_info: Arc<RwLock<Option<StreamInfo>>>,
    /// Tags returned per path.
    tags: Arc<RwLock<HashMap<PathBuf, ContainerTags>>>,
    /// Whether tag probes fail.
    tags_error: Arc<RwLock<bool>>,
    exit_success: Arc<RwLock<bool>>,
    create_output: Arc<RwLock<bool>>,
    /// If set, encode returns this error reason.
    encode_error: Arc<RwLock<Option<String>>>,
    panic_on_encode: Arc<RwLock<bool>>,
    status_lines: Arc<RwLock<Vec<String>>>,
    encode_delay: Arc<RwLock<Duration>>,
}

impl Default for MockMediaTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaTool {
    /// Create a mock that succeeds and produces output.
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(Vec::new())),
            stream_info: Arc::new(RwLock::new(Some(StreamInfo {
                total_frames: Some(300),
                fps: Some(25.0),
                duration_secs: Some(12.0),
            }))),
            tags: Arc::new(RwLock::new(HashMap::new())),
            tags_error: Arc::new(RwLock::new(false)),
            exit_success: Arc::new(RwLock::new(true)),
            create_output: Arc::new(RwLock::new(true)),
            encode_error: Arc::new(RwLock::new(None)),
            panic_on_encode: Arc::new(RwLock::new(false)),
            status_lines: Arc::new(RwLock::new(vec![
                "frame=  150 fps= 50 q=28.0 size=  256kB time=00:00:06.00 speed=2.0x".to_string(),
                "frame=  300 fps= 50 q=28.0 size=  512kB time=00:00:12.00 speed=2.0x".to_string(),
            ])),
            encode_delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Arguments of every encode call, in order.
    pub async fn encode_runs(&self) -> Vec<Vec<String>> {
        self.runs.read().await.clone()
    }

    pub async fn encode_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Set the stream probe result, or make it fail with `None`.
    pub async fn set_stream_info(&self, info: Option<StreamInfo>) {
        *self.stream_info.write().await = info;
    }

    /// Tags returned for `path`. Unknown paths have no tags.
    pub async fn set_tags(&self, path: impl AsRef<Path>, tags: ContainerTags) {
        self.tags
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), tags);
    }

    pub async fn set_tags_error(&self, fail: bool) {
        *self.tags_error.write().await = fail;
    }

    /// Exit status reported by the encoder.
    pub async fn set_exit_success(&self, success: bool) {
        *self.exit_success.write().await = success;
    }

    /// Whether an encode writes its output file.
    pub async fn set_create_output(&self, create: bool) {
        *self.create_output.write().await = create;
    }

    /// Make encode return an error.
    pub async fn set_encode_error(&self, reason: Option<String>) {
        *self.encode_error.write().await = reason;
    }

    /// Make encode panic.
    pub async fn set_panic_on_encode(&self, panic: bool) {
        *self.panic_on_encode.write().await = panic;
    }

    /// Status lines fed to the progress callback.
    pub async fn set_status_lines(&self, lines: Vec<String>) {
        *self.status_lines.write().await = lines;
    }

    /// Simulated encode duration.
    pub async fn set_encode_delay(&self, delay: Duration) {
        *self.encode_delay.write().await = delay;
    }
}

#[async_trait]
impl MediaTool for MockMediaTool {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe_stream(&self, _path: &Path) -> Result<StreamInfo, PostProcessError> {
        (*self.stream_info.read().await)
            .ok_or_else(|| PostProcessError::probe_failed("mock stream probe failure"))
    }

    async fn probe_tags(&self, path: &Path) -> Result<ContainerTags, PostProcessError> {
        if *self.tags_error.read().await {
            return Err(PostProcessError::probe_failed("mock tag probe failure"));
        }
        Ok(self
            .tags
            .read()
            .await
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    async fn encode(
        &self,
        args: &[String],
        on_line: &mut StatusLineSink<'_>,
    ) -> Result<bool, PostProcessError> {
        self.runs.write().await.push(args.to_vec());

        if *self.panic_on_encode.read().await {
            panic!("mock encoder crashed");
        }

        if let Some(reason) = self.encode_error.read().await.clone() {
            return Err(PostProcessError::tool_failed(reason));
        }

        let delay = *self.encode_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let lines = self.status_lines.read().await.clone();
        for line in lines.iter() {
            on_line(line.as_str());
        }

        let success = *self.exit_success.read().await;
        if *self.create_output.read().await {
            if let Some(output) = args.last() {
                tokio::fs::write(output, b"encoded").await?;
            }
        }

        Ok(success)
    }
}
