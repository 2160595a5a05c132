//! Translation cache with TTL expiry and LRU eviction.
//!
//! [`CachedTranslator`] wraps any [`Translator`] and stores successful
//! translations per source text. Only cache misses are forwarded, as a single
//! batch in their original order. Failed items are never cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::TranslationError;
use crate::translation::traits::{ItemResult, Translator};

/// Configuration for the translation cache.
#[derive(Debug, Clone)]
pub struct TranslationCacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// How long an entry stays valid.
    pub ttl: Duration,
}

impl Default for TranslationCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl TranslationCacheConfig {
    /// Create a new cache configuration.
    #[must_use]
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self { max_entries, ttl }
    }
}

/// Statistics for the translation cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Number of entries removed to make room or because they expired.
    pub evictions: u64,
    /// Current number of entries.
    pub entries: usize,
}

impl CacheStats {
    /// Calculate the hit rate as a percentage.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                (self.hits as f64 / total as f64) * 100.0
            }
        }
    }
}

struct CacheEntry {
    translation: String,
    inserted_at: Instant,
    last_access: u64,
}

/// A caching wrapper for translators.
pub struct CachedTranslator<T: Translator> {
    inner: T,
    config: TranslationCacheConfig,
    cache: RwLock<HashMap<String, CacheEntry>>,
    access_counter: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<T: Translator> CachedTranslator<T> {
    /// Wrap `inner` with a cache.
    #[must_use]
    pub fn new(inner: T, config: TranslationCacheConfig) -> Self {
        Self {
            inner,
            config,
            cache: RwLock::new(HashMap::new()),
            access_counter: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Wrap `inner` with the default cache configuration.
    #[must_use]
    pub fn with_defaults(inner: T) -> Self {
        Self::new(inner, TranslationCacheConfig::default())
    }

    /// The wrapped translator.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Remove every entry.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn get_cached(&self, text: &str, now: Instant) -> Option<String> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        match cache.get_mut(text) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.config.ttl => {
                entry.last_access = self.access_counter.fetch_add(1, Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.translation.clone())
            }
            Some(_) => {
                cache.remove(text);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert_cached(&self, text: &str, translation: String, now: Instant) {
        if self.config.max_entries == 0 {
            return;
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);

        if !cache.contains_key(text) && cache.len() >= self.config.max_entries {
            let ttl = self.config.ttl;
            let before = cache.len();
            cache.retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);
            self.evictions
                .fetch_add((before - cache.len()) as u64, Ordering::Relaxed);
        }

        while !cache.contains_key(text) && cache.len() >= self.config.max_entries {
            let lru_key = cache
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(k, _)| k.clone());

            if let Some(key) = lru_key {
                cache.remove(&key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            } else {
                break;
            }
        }

        let access_time = self.access_counter.fetch_add(1, Ordering::Relaxed);
        cache.insert(
            text.to_string(),
            CacheEntry {
                translation,
                inserted_at: now,
                last_access: access_time,
            },
        );
    }
}

#[async_trait]
impl<T: Translator> Translator for CachedTranslator<T> {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemResult>, TranslationError> {
        let now = Instant::now();
        let mut results: Vec<Option<ItemResult>> = vec![None; texts.len()];
        let mut uncached_indices = Vec::new();
        let mut uncached_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if let Some(translation) = self.get_cached(text, now) {
                results[i] = Some(Ok(translation));
            } else {
                uncached_indices.push(i);
                uncached_texts.push(text.clone());
            }
        }

        if !uncached_texts.is_empty() {
            let translated = self.inner.translate_batch(&uncached_texts).await?;
            if translated.len() != uncached_texts.len() {
                return Err(TranslationError::Malformed(format!(
                    "expected {} translations, got {}",
                    uncached_texts.len(),
                    translated.len()
                )));
            }

            let now = Instant::now();
            for (i, outcome) in uncached_indices.into_iter().zip(translated) {
                if let Ok(translation) = &outcome {
                    if !translation.trim().is_empty() {
                        self.insert_cached(&texts[i], translation.clone(), now);
                    }
                }
                results[i] = Some(outcome);
            }
        }

        tracing::debug!(
            total = texts.len(),
            hits = self.hits.load(Ordering::Relaxed),
            "Translation cache lookup"
        );

        Ok(results
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.unwrap_or(Err(TranslationError::MissingItem(i))))
            .collect())
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::MockTranslator;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_cache_hit() {
        let cached = CachedTranslator::with_defaults(MockTranslator::new());

        let first = cached.translate_batch(&texts(&["xin chào"])).await.unwrap();
        assert_eq!(cached.stats().misses, 1);

        let second = cached.translate_batch(&texts(&["xin chào"])).await.unwrap();
        assert_eq!(cached.stats().hits, 1);
        assert_eq!(first[0].as_deref().ok(), second[0].as_deref().ok());
        // The second call was fully served from the cache.
        assert_eq!(cached.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_only_misses_forwarded_in_order() {
        let cached = CachedTranslator::with_defaults(MockTranslator::new());
        cached.translate_batch(&texts(&["b"])).await.unwrap();

        let out = cached.translate_batch(&texts(&["a", "b", "c"])).await.unwrap();
        let out: Vec<String> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["a_en", "b_en", "c_en"]);
        assert_eq!(cached.inner().texts_seen(), 3);
    }

    #[tokio::test]
    async fn test_failed_items_not_cached() {
        let cached = CachedTranslator::with_defaults(MockTranslator::new().failing_on("bad"));
        let out = cached.translate_batch(&texts(&["bad", "good"])).await.unwrap();
        assert!(out[0].is_err());
        assert_eq!(cached.stats().entries, 1);

        cached.translate_batch(&texts(&["bad"])).await.unwrap();
        assert_eq!(cached.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn test_whole_call_failure_propagates() {
        let cached = CachedTranslator::with_defaults(MockTranslator::new().failing());
        assert!(cached.translate_batch(&texts(&["x"])).await.is_err());
        assert_eq!(cached.stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let config = TranslationCacheConfig::new(10, Duration::from_secs(60));
        let cached = CachedTranslator::new(MockTranslator::new(), config);

        cached.translate_batch(&texts(&["x"])).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        cached.translate_batch(&texts(&["x"])).await.unwrap();

        assert_eq!(cached.inner().call_count(), 2);
        assert_eq!(cached.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let config = TranslationCacheConfig::new(2, Duration::from_secs(3600));
        let cached = CachedTranslator::new(MockTranslator::new(), config);

        cached.translate_batch(&texts(&["1"])).await.unwrap();
        cached.translate_batch(&texts(&["2"])).await.unwrap();
        // Touch "1" so "2" becomes least recently used.
        cached.translate_batch(&texts(&["1"])).await.unwrap();
        cached.translate_batch(&texts(&["3"])).await.unwrap();

        let stats = cached.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 1);

        let calls = cached.inner().call_count();
        cached.translate_batch(&texts(&["1"])).await.unwrap();
        assert_eq!(cached.inner().call_count(), calls);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let cached = CachedTranslator::with_defaults(MockTranslator::new());
        cached.translate_batch(&texts(&["a", "b"])).await.unwrap();
        assert_eq!(cached.stats().entries, 2);
        cached.clear_cache();
        assert_eq!(cached.stats().entries, 0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 75.0).abs() < f64::EPSILON);
    }
}
