//! Types for the acquisition module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date layout used by the remote catalog for upload dates.
pub const UPLOAD_DATE_FORMAT: &str = "%Y%m%d";

/// A single item from a remote media catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Catalog identifier. Used for dedup and for matching files on disk.
    pub id: String,
    /// Display title.
    pub title: Option<String>,
    /// Channel or uploader name.
    pub uploader: Option<String>,
    /// Upload date, when the catalog reports one.
    pub upload_date: Option<NaiveDate>,
    /// Canonical page URL.
    pub url: Option<String>,
}

impl MediaItem {
    /// Creates an item carrying only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            uploader: None,
            upload_date: None,
            url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    pub fn with_upload_date(mut self, date: NaiveDate) -> Self {
        self.upload_date = Some(date);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Title for log lines, falling back to the identifier.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    /// What to hand to the acquisition tool. The bare identifier is accepted
    /// when no URL is known.
    pub fn source(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.id)
    }
}

/// Parses a `YYYYMMDD` upload date. Malformed input yields `None`.
pub fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), UPLOAD_DATE_FORMAT).ok()
}

/// One way of asking the acquisition tool for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionStrategy {
    /// Format selector passed to the tool.
    pub selector: String,
    /// Impersonate an alternate client when fetching.
    #[serde(default)]
    pub alternate_client: bool,
}

impl AcquisitionStrategy {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            alternate_client: false,
        }
    }

    pub fn alternate(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            alternate_client: true,
        }
    }
}

impl fmt::Display for AcquisitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alternate_client {
            write!(f, "{} (alternate client)", self.selector)
        } else {
            f.write_str(&self.selector)
        }
    }
}

/// Ordered primary strategies, highest quality first.
pub fn primary_strategies() -> Vec<AcquisitionStrategy> {
    [
        "bestvideo*+bestaudio/best",
        "best[height>=720]/best",
        "best[height>=480]/best",
        "best[height>=360]/best",
        "best",
    ]
    .into_iter()
    .map(AcquisitionStrategy::new)
    .collect()
}

/// Last resort once every primary strategy is exhausted.
pub fn fallback_strategy() -> AcquisitionStrategy {
    AcquisitionStrategy::alternate("best")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_date() {
        assert_eq!(
            parse_upload_date("20240131"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(parse_upload_date("2024-01-31"), None);
        assert_eq!(parse_upload_date(""), None);
        assert_eq!(parse_upload_date("20241345"), None);
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let item = MediaItem::new("abcdefgh123");
        assert_eq!(item.display_title(), "abcdefgh123");
        let item = item.with_title("A Talk");
        assert_eq!(item.display_title(), "A Talk");
    }

    #[test]
    fn test_source_prefers_url() {
        let item = MediaItem::new("abcdefgh123");
        assert_eq!(item.source(), "abcdefgh123");
        let item = item.with_url("https://www.youtube.com/watch?v=abcdefgh123");
        assert_eq!(item.source(), "https://www.youtube.com/watch?v=abcdefgh123");
    }

    #[test]
    fn test_strategy_order() {
        let strategies = primary_strategies();
        assert_eq!(strategies.len(), 5);
        assert_eq!(strategies[0].selector, "bestvideo*+bestaudio/best");
        assert_eq!(strategies[4].selector, "best");
        assert!(strategies.iter().all(|s| !s.alternate_client));

        let fallback = fallback_strategy();
        assert!(fallback.alternate_client);
        assert_eq!(fallback.to_string(), "best (alternate client)");
    }
}
