/*!
 * Lookup caching.
 *
 * Hovering the same word again should not hit the network again. Only
 * successful lookups are stored; failures are retried on the next hover.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Source text to translate
    source_text: String,

    /// Source language code
    source_language: String,

    /// Target language code
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counters {
    hits: usize,
    misses: usize,
}

/// Translation cache shared between clones
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit/miss counters
    counters: Arc<RwLock<Counters>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(RwLock::new(Counters::default())),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.cache.read().get(&key).cloned();

        let mut counters = self.counters.write();
        if found.is_some() {
            counters.hits += 1;
            debug!("Cache hit for '{}' ({} -> {})", source_text, source_language, target_language);
        } else {
            counters.misses += 1;
        }

        found
    }

    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Get cache statistics: hits, misses, hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let counters = *self.counters.read();
        let total = counters.hits + counters.misses;

        let hit_rate = if total > 0 {
            counters.hits as f64 / total as f64
        } else {
            0.0
        };

        (counters.hits, counters.misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.counters.write() = Counters::default();
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

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}
