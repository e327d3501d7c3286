//! Acquisition of media items with layered fallbacks.
//!
//! The [`Acquirer`] walks an ordered list of [`AcquisitionStrategy`] values,
//! from a combined best-video+best-audio selection down to an unconstrained
//! `best`, retrying each a fixed number of times. When all of them fail it
//! tries once more while impersonating an alternate client.
//!
//! # Example
//!
//! ```ignore
//! use vidfetch_core::acquisition::{Acquirer, DownloaderConfig, MediaItem, YtDlp};
//!
//! let config = DownloaderConfig::default();
//! let acquirer = Acquirer::new(Arc::new(YtDlp::new(config.clone())), &config);
//!
//! let item = MediaItem::new("dQw4w9WgXcQ");
//! match acquirer.acquire(&item, Path::new("/media"), config.max_retries).await {
//!     Some(path) => println!("Saved to {}", path.display()),
//!     None => println!("Gave up"),
//! }
//! ```

mod config;
mod engine;
mod error;
mod locator;
mod tool;
mod types;

pub use config::DownloaderConfig;
pub use engine::Acquirer;
pub use error::AcquireError;
pub use locator::{extract_identifier, locate, thumbnail_path, THUMBNAIL_EXTENSION};
pub use tool::{AcquisitionTool, YtDlp};
pub use types::{
    fallback_strategy, parse_upload_date, primary_strategies, AcquisitionStrategy, MediaItem,
    UPLOAD_DATE_FORMAT,
};
