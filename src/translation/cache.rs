/*!
 * Translation caching functionality.
 *
 * This module provides the dedup cache that maps canonical (tag-protected)
 * source text to its translated template. It is consulted before any network
 * call, written after every successful batch, loaded once at startup and
 * written back to disk once at the end of a run.
 */

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use log::{debug, info};

use crate::errors::TranslationError;
use crate::file_utils::FileManager;

/// Translation cache for storing and retrieving translated templates
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<String, String>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl TranslationCache {
    /// Create a new, empty translation cache
    pub fn new() -> Self {
        Self::from_entries(HashMap::new())
    }

    /// Create a cache pre-seeded with entries
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(entries)),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load a persisted cache, a missing file gives an empty cache
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TranslationError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No translation cache at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::Cache(format!("Failed to read {}: {}", path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| TranslationError::Cache(format!("Failed to parse {}: {}", path.display(), e)))?;
        info!("Loaded {} cached translations from {}", entries.len(), path.display());
        Ok(Self::from_entries(entries))
    }

    /// Get a translated template from the cache
    pub fn get(&self, source_text: &str) -> Option<String> {
        let cache = self.cache.read();

        match cache.get(source_text) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}'", truncate_text(source_text, 30));
                Some(translation.clone())
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for '{}'", truncate_text(source_text, 30));
                None
            }
        }
    }

    /// Store a translated template in the cache, last write wins
    pub fn store(&self, source_text: &str, translation: &str) {
        let mut cache = self.cache.write();
        cache.insert(source_text.to_string(), translation.to_string());

        debug!("Cached translation for '{}'", truncate_text(source_text, 30));
    }

    /// Write the whole cache to `path`
    ///
    /// The file is written to a temporary sibling first and renamed over the
    /// target, so an interrupted flush leaves the previous file intact.
    pub fn flush<P: AsRef<Path>>(&self, path: P) -> Result<(), TranslationError> {
        let path = path.as_ref();
        let snapshot = self.snapshot();

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| TranslationError::Cache(e.to_string()))?;
        FileManager::write_atomic(path, &json)
            .map_err(|e| TranslationError::Cache(format!("{:#}", e)))?;

        info!("Saved {} cached translations to {}", snapshot.len(), path.display());
        Ok(())
    }

    /// Copy of every entry
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.cache.read().clone()
    }

    /// Get cache statistics
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);

        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
