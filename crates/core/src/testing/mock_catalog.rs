//! Mock catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::acquisition::MediaItem;
use crate::catalog::{Catalog, CatalogError, MetadataLookup};

/// Mock implementation of the Catalog and MetadataLookup traits.
///
/// Listings are configured per URL. Lookups search every configured item
/// plus any registered individually.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    listings: Arc<RwLock<HashMap<String, Vec<MediaItem>>>>,
    items: Arc<RwLock<HashMap<String, MediaItem>>>,
    list_calls: Arc<RwLock<Vec<String>>>,
    lookup_calls: Arc<RwLock<Vec<String>>>,
    fail_lookups: Arc<RwLock<bool>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items returned for `url`.
    pub async fn set_listing(&self, url: impl Into<String>, items: Vec<MediaItem>) {
        let mut known = self.items.write().await;
        for item in &items {
            known.insert(item.id.clone(), item.clone());
        }
        self.listings.write().await.insert(url.into(), items);
    }

    /// Make one item available to lookups.
    pub async fn add_item(&self, item: MediaItem) {
        self.items.write().await.insert(item.id.clone(), item);
    }

    pub async fn set_fail_lookups(&self, fail: bool) {
        *self.fail_lookups.write().await = fail;
    }

    pub async fn list_calls(&self) -> Vec<String> {
        self.list_calls.read().await.clone()
    }

    pub async fn lookup_calls(&self) -> Vec<String> {
        self.lookup_calls.read().await.clone()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list(&self, url: &str) -> Result<Vec<MediaItem>, CatalogError> {
        self.list_calls.write().await.push(url.to_string());
        self.listings
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                query: url.to_string(),
            })
    }
}

#[async_trait]
impl MetadataLookup for MockCatalog {
    async fn lookup(&self, id: &str) -> Result<MediaItem, CatalogError> {
        self.lookup_calls.write().await.push(id.to_string());
        if *self.fail_lookups.read().await {
            return Err(CatalogError::tool_failed("mock lookup failure"));
        }
        self.items
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                query: id.to_string(),
            })
    }
}
