//! Trait definitions for the catalog module.

use async_trait::async_trait;

use super::error::CatalogError;
use crate::acquisition::MediaItem;

/// Lists the items behind a channel, playlist or single-video URL.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the name of this catalog implementation.
    fn name(&self) -> &str;

    /// A single-video URL yields a one-element list.
    async fn list(&self, url: &str) -> Result<Vec<MediaItem>, CatalogError>;
}

/// Looks up one item's metadata by identifier.
///
/// Callers treat this as best-effort: a failure means "no metadata".
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, id: &str) -> Result<MediaItem, CatalogError>;
}
