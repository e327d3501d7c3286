//! The acquisition tool seam and its yt-dlp implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::config::DownloaderConfig;
use super::error::AcquireError;
use super::types::{AcquisitionStrategy, MediaItem};

/// Something that can fetch one media item into a directory.
#[async_trait]
pub trait AcquisitionTool: Send + Sync {
    /// Returns the name of this tool implementation.
    fn name(&self) -> &str;

    /// Runs a single attempt with the given strategy.
    ///
    /// Returns whether the tool reported success. Locating the produced file
    /// is the caller's job.
    async fn run_attempt(
        &self,
        item: &MediaItem,
        strategy: &AcquisitionStrategy,
        output_dir: &Path,
    ) -> Result<bool, AcquireError>;
}

/// yt-dlp invoked as a subprocess that inherits the terminal.
#[derive(Debug, Clone)]
pub struct YtDlp {
    config: DownloaderConfig,
}

impl YtDlp {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DownloaderConfig::default())
    }

    /// Builds the full argument list for one attempt.
    pub fn build_args(
        &self,
        item: &MediaItem,
        strategy: &AcquisitionStrategy,
        output_dir: &Path,
    ) -> Vec<String> {
        let template = output_dir.join(&self.config.output_template);
        let mut args = vec![
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            "-f".to_string(),
            strategy.selector.clone(),
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
        ];

        if let Some(browser) = &self.config.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        if strategy.alternate_client {
            args.push("--extractor-args".to_string());
            args.push(self.config.alternate_client_args.clone());
        }

        args.extend([
            "--write-thumbnail".to_string(),
            "--convert-thumbnails".to_string(),
            "jpg".to_string(),
            "--progress".to_string(),
            "--retries".to_string(),
            self.config.tool_retries.to_string(),
            "--fragment-retries".to_string(),
            self.config.fragment_retries.to_string(),
        ]);

        args.push(item.source().to_string());
        args
    }
}

#[async_trait]
impl AcquisitionTool for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn run_attempt(
        &self,
        item: &MediaItem,
        strategy: &AcquisitionStrategy,
        output_dir: &Path,
    ) -> Result<bool, AcquireError> {
        let args = self.build_args(item, strategy, output_dir);
        debug!(binary = %self.config.binary.display(), ?args, "Running acquisition tool");

        // stdout/stderr are inherited so the tool's own progress stays visible.
        let status = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AcquireError::ToolNotFound {
                        path: self.config.binary.clone(),
                    }
                } else {
                    AcquireError::tool_failed(e.to_string())
                }
            })?;

        Ok(status.success())
    }
}
