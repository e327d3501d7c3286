//! Listing filter and ordering.

use chrono::NaiveDate;

use crate::acquisition::MediaItem;

/// Keeps items uploaded after `after_date` whose title contains `keyword`
/// (case-insensitive), newest first.
///
/// Undated items pass the date filter and sort last. Items without a title
/// never match a keyword.
pub fn filter_items(
    items: Vec<MediaItem>,
    after_date: Option<NaiveDate>,
    keyword: Option<&str>,
) -> Vec<MediaItem> {
    let keyword = keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase);

    let mut kept: Vec<MediaItem> = items
        .into_iter()
        .filter(|item| match (after_date, item.upload_date) {
            (Some(threshold), Some(date)) => date > threshold,
            _ => true,
        })
        .filter(|item| match &keyword {
            Some(keyword) => item
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(keyword)),
            None => true,
        })
        .collect();

    // Option orders None first, so descending puts undated items last.
    kept.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
    kept
}

/// A one-item listing for a watch URL is a single video and skips filtering.
pub fn is_single_video(url: &str, items: &[MediaItem]) -> bool {
    items.len() == 1 && url.contains("watch")
}
