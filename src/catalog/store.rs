//! Catalog store
//!
//! Owned cache for the parsed channel list. The store is created by the caller
//! and handed to loaders; clones share the same cache.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::Channel;

/// Shared handle to the cached channel catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    inner: Arc<RwLock<Option<Arc<Vec<Channel>>>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached catalog, if one has been loaded
    pub fn get(&self) -> Option<Arc<Vec<Channel>>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the cached catalog wholesale
    pub fn replace(&self, channels: Vec<Channel>) -> Arc<Vec<Channel>> {
        let channels = Arc::new(channels);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(channels.clone());
        channels
    }

    /// Drop the cached catalog so the next load re-fetches
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.get().is_some()
    }

    /// Number of cached channels (0 when nothing is loaded)
    pub fn len(&self) -> usize {
        self.get().map(|channels| channels.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First cached channel with the given id
    pub fn find(&self, id: &str) -> Option<Channel> {
        self.get()?.iter().find(|channel| channel.id == id).cloned()
    }

    /// Cached channel at a list position
    pub fn channel_at(&self, index: usize) -> Option<Channel> {
        self.get()?.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = CatalogStore::new();
        assert!(!store.is_loaded());
        assert_eq!(store.len(), 0);
        assert!(store.find("a").is_none());
    }

    #[test]
    fn test_replace_and_clear() {
        let store = CatalogStore::new();
        let stored = store.replace(vec![channel("a"), channel("b")]);
        assert!(Arc::ptr_eq(&stored, &store.get().unwrap()));
        assert_eq!(store.len(), 2);
        assert_eq!(store.find("b").unwrap().id, "b");
        assert_eq!(store.channel_at(0).unwrap().id, "a");
        assert!(store.channel_at(2).is_none());

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_clones_share_cache() {
        let store = CatalogStore::new();
        let other = store.clone();
        store.replace(vec![channel("a")]);
        assert!(other.is_loaded());
        other.clear();
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_empty_catalog_still_counts_as_loaded() {
        let store = CatalogStore::new();
        store.replace(Vec::new());
        assert!(store.is_loaded());
        assert!(store.is_empty());
    }
}
