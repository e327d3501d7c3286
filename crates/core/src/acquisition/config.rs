//! Configuration for the acquisition module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the yt-dlp based acquisition tool and its retry engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Additional attempts per strategy after the first one fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts of the same strategy, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause before switching to the next strategy, in milliseconds.
    #[serde(default = "default_strategy_delay_ms")]
    pub strategy_delay_ms: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser to borrow cookies from, if any.
    #[serde(default = "default_cookies_from_browser")]
    pub cookies_from_browser: Option<String>,

    /// Tool-internal retry count for the whole download.
    #[serde(default = "default_tool_retries")]
    pub tool_retries: u32,

    /// Tool-internal retry count per fragment.
    #[serde(default = "default_tool_retries")]
    pub fragment_retries: u32,

    /// Extractor arguments used by the alternate-client fallback.
    #[serde(default = "default_alternate_client_args")]
    pub alternate_client_args: String,

    /// Output naming template, relative to the output directory.
    #[serde(default = "default_output_template")]
    pub output_template: String,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_strategy_delay_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_cookies_from_browser() -> Option<String> {
    Some("chrome".to_string())
}

fn default_tool_retries() -> u32 {
    3
}

fn default_alternate_client_args() -> String {
    "youtube:player_client=android".to_string()
}

fn default_output_template() -> String {
    "%(title)s [%(id)s].%(ext)s".to_string()
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            strategy_delay_ms: default_strategy_delay_ms(),
            user_agent: default_user_agent(),
            cookies_from_browser: default_cookies_from_browser(),
            tool_retries: default_tool_retries(),
            fragment_retries: default_tool_retries(),
            alternate_client_args: default_alternate_client_args(),
            output_template: default_output_template(),
        }
    }
}

impl DownloaderConfig {
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets both pauses at once. Tests use zero to run without sleeping.
    pub fn with_delays(mut self, retry: Duration, strategy: Duration) -> Self {
        self.retry_delay_ms = retry.as_millis() as u64;
        self.strategy_delay_ms = strategy.as_millis() as u64;
        self
    }

    pub fn with_cookies_from_browser(mut self, browser: Option<String>) -> Self {
        self.cookies_from_browser = browser;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn strategy_delay(&self) -> Duration {
        Duration::from_millis(self.strategy_delay_ms)
    }
}
