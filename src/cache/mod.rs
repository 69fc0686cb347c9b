//! Time-expiring response caches with batch eviction.
//!
//! Entries are valid while younger than the TTL; expiry is evaluated lazily
//! on read, never swept proactively. When an insert pushes the store past
//! capacity, the oldest entries are evicted in one batch rather than one at
//! a time, so a full sort is not paid on every single insert at capacity.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// A cached value with its insertion metadata.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    /// Monotonic insertion sequence, used as the eviction order. Instants can
    /// collide at coarse clock resolution; the sequence cannot.
    seq: u64,
}

/// A bounded key-value store where entries expire after a fixed TTL.
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
    eviction_batch: usize,
    next_seq: u64,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given TTL, capacity, and eviction batch size.
    pub fn new(ttl: Duration, capacity: usize, eviction_batch: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
            eviction_batch,
            next_seq: 0,
        }
    }

    /// Look up a key, returning the value only if the entry is still valid.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            debug!(key, "cache hit");
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Insert a value, evicting the oldest batch if over capacity.
    pub fn set(&mut self, key: &str, value: V) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                seq,
            },
        );

        if self.entries.len() > self.capacity {
            self.evict_oldest();
        }
    }

    /// Remove the oldest `eviction_batch` entries by insertion order.
    fn evict_oldest(&mut self) {
        let mut ordered: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.seq))
            .collect();
        ordered.sort_by_key(|(_, seq)| *seq);

        let evicted: Vec<String> = ordered
            .into_iter()
            .take(self.eviction_batch)
            .map(|(k, _)| k)
            .collect();
        for key in &evicted {
            self.entries.remove(key);
        }
        debug!(count = evicted.len(), "evicted oldest cache entries");
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current entry count, including entries that have expired but not
    /// yet been evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a cache key from an operation, target language, and the normalized
/// (trimmed, lowercased) text. Identical requests under different target
/// languages must miss each other.
pub fn cache_key(operation: &str, language: &str, text: &str) -> String {
    format!("{}:{}:{}", operation, language, text.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_round_trip() {
        let mut cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60), 10, 2);
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut cache: TtlCache<String> = TtlCache::new(Duration::ZERO, 10, 2);
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), None);
        // Lazy expiry: the entry is still counted until evicted.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_batch_eviction_removes_oldest() {
        let capacity = 10;
        let batch = 4;
        let mut cache: TtlCache<usize> = TtlCache::new(Duration::from_secs(60), capacity, batch);

        for i in 0..=capacity {
            cache.set(&format!("key-{}", i), i);
        }

        // capacity + 1 inserts, one batch evicted.
        assert_eq!(cache.len(), capacity - batch + 1);
        // The evicted entries are exactly the oldest ones.
        for i in 0..batch {
            assert_eq!(cache.get(&format!("key-{}", i)), None);
        }
        for i in batch..=capacity {
            assert_eq!(cache.get(&format!("key-{}", i)), Some(i));
        }
    }

    #[test]
    fn test_clear() {
        let mut cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60), 10, 2);
        cache.set("k", "v".to_string());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(
            cache_key("grammar", "english", "  Hello World  "),
            "grammar:english:hello world"
        );
        // Different target languages never share an entry.
        assert_ne!(
            cache_key("grammar", "english", "olá"),
            cache_key("grammar", "portuguese", "olá")
        );
    }
}
