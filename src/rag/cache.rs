//! Query Result Cache for the RAG Pipeline
//!
//! Memoizes `query -> results` so repeated questions skip both the embedding
//! call and the index query.
//!
//! # Semantics
//!
//! - Keys are the raw query string. No trimming or case folding, so
//!   `"Rust"` and `"rust "` are distinct entries.
//! - Entries live in append order. A lookup returns the first entry whose
//!   query matches and whose age is below the TTL.
//! - Invalidation is lazy: an expired entry is a miss but stays in place until
//!   it is trimmed, purged with [`QueryCache::purge_expired`], or cleared.
//! - When a put pushes the length past `max_entries`, the oldest
//!   `trim_count` entries are dropped in one go. Duplicate queries are not
//!   merged; each put appends.
//!
//! # Example
//!
//! ```ignore
//! use recall::rag::cache::{CacheConfig, QueryCache};
//!
//! let cache = QueryCache::new(CacheConfig::default());
//! if let Some(results) = cache.get("what is a vector db") {
//!     // use cached results
//! } else {
//!     let results = index.query(&embedding, 5, None).await?;
//!     cache.put("what is a vector db", results.clone());
//! }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::SearchResult;

// ============================================================================
// Cache Types
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries dropped by bulk trimming
    pub evictions: u64,
    /// Number of entries in cache, expired ones included
    pub entries: usize,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Configuration for the query cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the cache is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Entry lifetime in seconds (default: 300)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Length above which a put triggers trimming (default: 100)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// How many of the oldest entries a trim removes (default: 50)
    #[serde(default = "default_trim_count")]
    pub trim_count: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_max_entries() -> usize {
    100
}

fn default_trim_count() -> usize {
    50
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            trim_count: default_trim_count(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    query: String,
    results: Vec<SearchResult>,
    timestamp: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.timestamp.elapsed() < ttl
    }
}

// ============================================================================
// Query Cache
// ============================================================================

/// Append-ordered, TTL-bounded, bulk-trimmed result cache.
///
/// Thread-safe via `parking_lot::RwLock`; the append and trim of a put happen
/// under one write lock.
pub struct QueryCache {
    entries: RwLock<VecDeque<CacheEntry>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Look up fresh results for exactly `query`. `None` is a miss.
    pub fn get(&self, query: &str) -> Option<Vec<SearchResult>> {
        if !self.config.enabled {
            return None;
        }

        let ttl = self.config.ttl();
        let entries = self.entries.read();
        match entries
            .iter()
            .find(|e| e.query == query && e.is_fresh(ttl))
        {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(query = %query, "Query cache hit");
                Some(entry.results.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(query = %query, "Query cache miss");
                None
            }
        }
    }

    /// Append results for `query`, trimming the oldest entries when full.
    pub fn put(&self, query: impl Into<String>, results: Vec<SearchResult>) {
        if !self.config.enabled {
            return;
        }

        let mut entries = self.entries.write();
        entries.push_back(CacheEntry {
            query: query.into(),
            results,
            timestamp: Instant::now(),
        });

        if entries.len() > self.config.max_entries {
            let trim = self.config.trim_count.min(entries.len());
            entries.drain(..trim);
            self.evictions.fetch_add(trim as u64, Ordering::Relaxed);
            debug!(trimmed = trim, remaining = entries.len(), "Trimmed query cache");
        }
    }

    /// Remove every entry. Statistics are kept.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drop expired entries now instead of waiting for a trim.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.config.ttl();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.is_fresh(ttl));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use recall_vector::Metadata;

    fn result(id: &str) -> SearchResult {
        SearchResult::from_parts(id, 0.9, Metadata::new())
    }

    fn expired_cache() -> QueryCache {
        QueryCache::new(CacheConfig {
            ttl_secs: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = QueryCache::with_defaults();

        assert!(cache.get("q").is_none());
        assert_eq!(cache.stats().misses, 1);

        cache.put("q", vec![result("a")]);
        let hit = cache.get("q").unwrap();

        assert_eq!(hit[0].id, "a");
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_cache_key_is_exact_string() {
        let cache = QueryCache::with_defaults();
        cache.put("Rust", vec![result("a")]);

        assert!(cache.get("Rust").is_some());
        assert!(cache.get("rust").is_none());
        assert!(cache.get("Rust ").is_none());
    }

    #[test]
    fn test_expired_entries_miss_but_stay() {
        let cache = expired_cache();
        cache.put("q", vec![result("a")]);

        assert!(cache.get("q").is_none());
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bulk_trim_drops_oldest_half() {
        let cache = QueryCache::with_defaults();
        for i in 0..100 {
            cache.put(format!("q{}", i), vec![result("a")]);
        }
        assert_eq!(cache.len(), 100);

        cache.put("q100", vec![result("a")]);

        assert_eq!(cache.len(), 51);
        assert!(cache.get("q0").is_none());
        assert!(cache.get("q49").is_none());
        assert!(cache.get("q50").is_some());
        assert!(cache.get("q100").is_some());
        assert_eq!(cache.stats().evictions, 50);
    }

    #[test]
    fn test_duplicate_queries_accumulate() {
        let cache = QueryCache::with_defaults();
        cache.put("q", vec![result("first")]);
        cache.put("q", vec![result("second")]);

        assert_eq!(cache.len(), 2);
        // The oldest fresh entry wins.
        assert_eq!(cache.get("q").unwrap()[0].id, "first");
    }

    #[test]
    fn test_cache_clear() {
        let cache = QueryCache::with_defaults();
        cache.put("a", vec![]);
        cache.put("b", vec![]);

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_cache_disabled() {
        let cache = QueryCache::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });

        cache.put("q", vec![result("a")]);

        assert!(cache.get("q").is_none());
        assert!(cache.is_empty());
        assert!(!cache.is_enabled());
    }

    #[test]
    fn test_cached_empty_results_are_a_hit() {
        let cache = QueryCache::with_defaults();
        cache.put("nothing", vec![]);
        assert_eq!(cache.get("nothing"), Some(vec![]));
    }

    #[test]
    fn test_cache_hit_rate() {
        let stats = CacheStats {
            hits: 75,
            misses: 25,
            evictions: 0,
            entries: 0,
        };

        assert!((stats.hit_rate() - 75.0).abs() < 0.001);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
