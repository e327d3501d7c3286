use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::acquisition::{parse_upload_date, DownloaderConfig};
use crate::postprocess::PostProcessConfig;

/// Identifiers already acquired, one per line.
pub const LEDGER_FILE_NAME: &str = "downloaded_videos.log";
/// Free-text acquisition failures.
pub const ERROR_LOG_FILE_NAME: &str = "errors.log";
/// `OK`/`FAIL`/`ERROR` lines from the post-process worker.
pub const OUTCOME_LOG_FILE_NAME: &str = "transcode.log";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub post_process: PostProcessConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            downloader: DownloaderConfig::default(),
            post_process: PostProcessConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Config {
    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(LEDGER_FILE_NAME)
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.output_dir.join(ERROR_LOG_FILE_NAME)
    }

    pub fn outcome_log_path(&self) -> PathBuf {
        self.output_dir.join(OUTCOME_LOG_FILE_NAME)
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Only items uploaded after this `YYYYMMDD` date.
    #[serde(default)]
    pub after_date: Option<String>,
    /// Only items whose title contains this, case-insensitively.
    #[serde(default)]
    pub keyword: Option<String>,
}

impl FilterConfig {
    /// The parsed threshold. Validation rejects malformed dates up front.
    pub fn after_date(&self) -> Option<NaiveDate> {
        self.after_date.as_deref().and_then(parse_upload_date)
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }
}
