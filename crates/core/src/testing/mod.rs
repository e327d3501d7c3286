//! Testing utilities and mock implementations for integration tests.
//!
//! This module provides mock implementations of every external tool seam,
//! allowing the full acquire, post-process and reconcile flow to run
//! without yt-dlp or ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidfetch_core::testing::{MockAcquisitionTool, MockCatalog, MockMediaTool};
//!
//! let downloader = MockAcquisitionTool::new();
//! let media = MockMediaTool::new();
//! let catalog = MockCatalog::new();
//!
//! // Configure mock responses
//! downloader.set_succeed_on_attempt(Some(2)).await;
//! media.set_exit_success(false).await;
//! ```

mod mock_acquisition;
mod mock_catalog;
mod mock_media;

pub use mock_acquisition::{MockAcquisitionTool, RecordedAttempt};
pub use mock_catalog::MockCatalog;
pub use mock_media::MockMediaTool;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use crate::acquisition::MediaItem;
    use crate::config::Config;
    use crate::postprocess::ContainerTags;

    /// An item with a title, uploader and upload date.
    pub fn media_item(id: &str, title: &str) -> MediaItem {
        MediaItem::new(id)
            .with_title(title)
            .with_uploader("Test Channel")
            .with_upload_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default())
            .with_url(format!("https://www.youtube.com/watch?v={id}"))
    }

    /// Tags that mark a file as already finalized.
    pub fn full_tags(title: &str, artist: &str) -> ContainerTags {
        ContainerTags::new(HashMap::from([
            ("TITLE".to_string(), title.to_string()),
            ("ARTIST".to_string(), artist.to_string()),
        ]))
    }

    /// Writes a placeholder media file named the way the downloader names
    /// its output.
    pub async fn write_media_file(dir: &Path, title: &str, id: &str, ext: &str) -> PathBuf {
        let path = dir.join(format!("{title} [{id}].{ext}"));
        tokio::fs::write(&path, b"media")
            .await
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }

    /// Configuration rooted at `output_dir` with no delays and no progress
    /// rendering.
    pub fn fast_config(output_dir: &Path) -> Config {
        let mut config = Config::default();
        config.output_dir = output_dir.to_path_buf();
        config.downloader.retry_delay_ms = 0;
        config.downloader.strategy_delay_ms = 0;
        config.post_process.show_progress = false;
        config.post_process.poll_interval_ms = 20;
        config
    }
}
