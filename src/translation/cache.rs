/*!
 * Per-run chunk translation cache.
 *
 * Identical chunks (boilerplate paragraphs, repeated summaries) are only sent
 * to the translation service once per direction. Only non-empty successful
 * translations are stored.
 */

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cache key: digest of the chunk plus the direction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    digest: [u8; 32],
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            digest: Sha256::digest(text.as_bytes()).into(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Cache usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Whether lookups were active
    pub enabled: bool,
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups sent on to the service
    pub misses: usize,
    /// Translations stored
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 { self.hits as f64 / total as f64 } else { 0.0 }
    }
}

/// Thread-safe translation cache; clones share storage and counters
#[derive(Debug, Clone)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    enabled: bool,
}

impl TranslationCache {
    /// Create a new cache
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            enabled,
        }
    }

    /// Look up a translation
    pub fn get(&self, text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(text, source_language, target_language);
        match self.entries.read().get(&key) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit ({} -> {})", source_language, target_language);
                Some(translation.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a translation; empty translations are ignored
    pub fn store(&self, text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled || translation.trim().is_empty() {
            return;
        }

        let key = CacheKey::new(text, source_language, target_language);
        self.entries.write().insert(key, translation.to_string());
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Number of cached translations
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}
