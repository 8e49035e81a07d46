//! On-disk cache of fetched listing pages.

use crate::error::ScrapeError;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Thread-safe URL → HTML cache.
///
/// Uses DashMap for concurrent access without external locking. When a
/// backing file is set the cache can be loaded from and saved to it.
pub struct PageCache {
    entries: DashMap<String, String>,
    path: Option<PathBuf>,
}

impl PageCache {
    /// Creates an empty cache with no backing file.
    pub fn in_memory() -> Self {
        Self {
            entries: DashMap::new(),
            path: None,
        }
    }

    /// Creates a cache backed by `path`, loading it if the file exists.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let path = path.into();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let stored: HashMap<String, String> = serde_json::from_str(&content)?;
                info!(path = %path.display(), pages = stored.len(), "Loaded page cache");
                stored.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No page cache on disk yet");
                DashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    /// Loads the cache from `path` if given, otherwise keeps it in memory.
    pub async fn open(path: Option<&Path>) -> Result<Self, ScrapeError> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::in_memory()),
        }
    }

    pub fn get(&self, url: &str) -> Option<String> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, url: impl Into<String>, html: impl Into<String>) {
        self.entries.insert(url.into(), html.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the cache to its backing file. Does nothing for in-memory caches.
    pub async fn save(&self) -> Result<(), ScrapeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot: HashMap<String, String> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let json = serde_json::to_string(&snapshot)?;
        tokio::fs::write(path, json).await?;

        info!(path = %path.display(), pages = snapshot.len(), "Saved page cache");
        Ok(())
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::in_memory()
    }
}
