//! Catalog queries through yt-dlp's JSON dump mode.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::CatalogError;
use super::traits::{Catalog, MetadataLookup};
use crate::acquisition::{parse_upload_date, MediaItem};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Queries yt-dlp with `-J` and reads back the fields the pipeline needs.
#[derive(Debug, Clone)]
pub struct YtDlpCatalog {
    binary: PathBuf,
}

impl YtDlpCatalog {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    async fn dump_json(&self, args: &[&str]) -> Result<String, CatalogError> {
        debug!(binary = %self.binary.display(), ?args, "Querying catalog");
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CatalogError::ToolNotFound {
                        path: self.binary.clone(),
                    }
                } else {
                    CatalogError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(CatalogError::tool_failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Catalog for YtDlpCatalog {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn list(&self, url: &str) -> Result<Vec<MediaItem>, CatalogError> {
        let json = self
            .dump_json(&["--flat-playlist", "-J", "--no-warnings", url])
            .await?;
        parse_listing(&json, url)
    }
}

#[async_trait]
impl MetadataLookup for YtDlpCatalog {
    async fn lookup(&self, id: &str) -> Result<MediaItem, CatalogError> {
        let url = format!("{WATCH_URL}{id}");
        let json = self
            .dump_json(&["-J", "--skip-download", "--no-warnings", &url])
            .await?;
        let mut items = parse_listing(&json, &url)?;
        if items.is_empty() {
            return Err(CatalogError::NotFound {
                query: id.to_string(),
            });
        }
        Ok(items.swap_remove(0))
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    upload_date: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    #[serde(default)]
    entries: Option<Vec<Option<RawEntry>>>,
}

impl RawEntry {
    fn into_item(self, fallback_url: Option<&str>, prefer_url: bool) -> Option<MediaItem> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let url = if prefer_url {
            self.url.or(self.webpage_url)
        } else {
            self.webpage_url.or(self.url)
        }
        .or_else(|| fallback_url.map(str::to_string));

        Some(MediaItem {
            id,
            title: self.title,
            uploader: self.uploader.or(self.channel),
            upload_date: self.upload_date.as_deref().and_then(parse_upload_date),
            url,
        })
    }
}

/// Parses a `-J` dump into items.
///
/// A dump without entries is a single video. Entries without an identifier
/// are dropped, nested playlists are flattened.
pub fn parse_listing(json: &str, requested_url: &str) -> Result<Vec<MediaItem>, CatalogError> {
    let mut root: RawEntry = serde_json::from_str(json).map_err(|e| CatalogError::ParseError {
        reason: e.to_string(),
    })?;

    match root.entries.take() {
        Some(entries) if !entries.is_empty() => {
            let mut items = Vec::new();
            collect_entries(entries, &mut items);
            Ok(items)
        }
        _ if root.kind.as_deref() == Some("playlist") => Ok(Vec::new()),
        _ => Ok(root
            .into_item(Some(requested_url), false)
            .into_iter()
            .collect()),
    }
}

fn collect_entries(entries: Vec<Option<RawEntry>>, out: &mut Vec<MediaItem>) {
    for mut entry in entries.into_iter().flatten() {
        match entry.entries.take() {
            Some(nested) => collect_entries(nested, out),
            None => {
                if let Some(item) = entry.into_item(None, true) {
                    out.push(item);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_channel_listing() {
        let json = r#"{
            "_type": "playlist",
            "id": "UC123",
            "entries": [
                {"id": "abcdefgh123", "title": "First", "channel": "Chan",
                 "url": "https://www.youtube.com/watch?v=abcdefgh123", "upload_date": "20240102"},
                {"title": "No id"},
                null,
                {"id": "zzzzzzzz999", "title": "Second", "uploader": "Up"}
            ]
        }"#;

        let items = parse_listing(json, "https://www.youtube.com/@chan").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "abcdefgh123");
        assert_eq!(items[0].uploader.as_deref(), Some("Chan"));
        assert_eq!(items[0].upload_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(
            items[0].url.as_deref(),
            Some("https://www.youtube.com/watch?v=abcdefgh123")
        );
        assert_eq!(items[1].uploader.as_deref(), Some("Up"));
        assert_eq!(items[1].url, None);
    }

    #[test]
    fn test_parse_nested_tabs() {
        let json = r#"{
            "id": "UC123",
            "entries": [
                {"id": "UC123-videos", "entries": [{"id": "abcdefgh123"}]},
                {"id": "UC123-shorts", "entries": [{"id": "zzzzzzzz999"}]}
            ]
        }"#;
        let items = parse_listing(json, "u").unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["abcdefgh123", "zzzzzzzz999"]);
    }

    #[test]
    fn test_parse_empty_nested_tab_is_not_an_item() {
        let json = r#"{
            "id": "UC123",
            "entries": [
                {"id": "UC123-shorts", "title": "Shorts", "entries": []},
                {"id": "UC123-videos", "entries": [{"id": "abcdefgh123"}]}
            ]
        }"#;
        let items = parse_listing(json, "u").unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["abcdefgh123"]);
    }

    #[test]
    fn test_parse_single_video() {
        let json = r#"{"_type": "video", "id": "abcdefgh123", "title": "Solo",
                       "upload_date": "bad", "webpage_url": "https://example.com/v"}"#;
        let items = parse_listing(json, "https://example.com/requested").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("Solo"));
        assert_eq!(items[0].upload_date, None);
        assert_eq!(items[0].url.as_deref(), Some("https://example.com/v"));

        let json = r#"{"id": "abcdefgh123"}"#;
        let items = parse_listing(json, "https://example.com/requested").unwrap();
        assert_eq!(items[0].url.as_deref(), Some("https://example.com/requested"));
    }

    #[test]
    fn test_parse_empty_playlist() {
        let json = r#"{"_type": "playlist", "id": "PL1", "entries": []}"#;
        assert!(parse_listing(json, "u").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_listing("nope", "u"),
            Err(CatalogError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let catalog = YtDlpCatalog::new("/nonexistent/yt-dlp");
        assert!(matches!(
            catalog.lookup("abcdefgh123").await,
            Err(CatalogError::ToolNotFound { .. })
        ));
    }
}
