//! Bounded keyed caches for the math engine.
//!
//! [`MathCache`] is a thread-safe cache with configurable capacity,
//! eviction policy (LRU default, LFU selectable), optional TTL measured
//! from insertion, and per-layer statistics. [`CacheManager`] composes the
//! four layers the engine uses: parsed trees (L1), evaluation results
//! (L2), derivatives (L3), and hot sub-expressions (L4).
//!
//! A capacity of zero disables a layer entirely: gets miss without
//! recording statistics and inserts are dropped.

mod manager;

pub use manager::{CacheManager, CacheManagerStats, CacheSettings, DerivativeKey, EvalKey};

use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Which entry to sacrifice when a layer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Least recently used (default)
    Lru,
    /// Least frequently used, with recency as the tiebreak
    Lfu,
}

/// Configuration for a single cache layer.
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// Maximum number of entries; zero disables the layer
    pub capacity: usize,
    pub policy: EvictionPolicy,
    /// Entries older than this (from insertion) are treated as absent
    pub ttl: Option<Duration>,
    /// Record hit/miss/eviction counters
    pub collect_stats: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { capacity: 256, policy: EvictionPolicy::Lru, ttl: None, collect_stats: false }
    }
}

/// Counters for one cache layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Sum of two stat snapshots, for whole-manager reporting.
    pub fn merged(self, other: CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            evictions: self.evictions + other.evictions,
            entries: self.entries + other.entries,
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    /// Logical clock of the last access, for LRU and LFU tiebreaks
    last_used: u64,
    uses: u64,
}

struct Inner<K, V> {
    entries: FxHashMap<K, Entry<V>>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Thread-safe bounded cache with pluggable eviction.
pub struct MathCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    inner: Mutex<Inner<K, V>>,
    config: LayerConfig,
}

impl<K, V> MathCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(config: LayerConfig) -> Self {
        MathCache {
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                tick: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.capacity > 0
    }

    /// Fetch a value, refreshing its recency/frequency bookkeeping.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let mut inner = self.inner.lock();

        if let Some(ttl) = self.config.ttl {
            let expired = inner
                .entries
                .get(key)
                .is_some_and(|entry| entry.inserted_at.elapsed() > ttl);
            if expired {
                inner.entries.remove(key);
            }
        }

        inner.tick += 1;
        let tick = inner.tick;
        let collect = self.config.collect_stats;
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = tick;
                entry.uses += 1;
                let value = entry.value.clone();
                if collect {
                    inner.hits += 1;
                }
                Some(value)
            }
            None => {
                if collect {
                    inner.misses += 1;
                }
                None
            }
        }
    }

    /// Insert or refresh a value, evicting per policy when full.
    pub fn insert(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.value = value;
            entry.inserted_at = Instant::now();
            entry.last_used = tick;
            return;
        }

        while inner.entries.len() >= self.config.capacity {
            let victim = match self.config.policy {
                EvictionPolicy::Lru => inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_used)
                    .map(|(k, _)| k.clone()),
                EvictionPolicy::Lfu => inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| (e.uses, e.last_used))
                    .map(|(k, _)| k.clone()),
            };
            match victim {
                Some(victim) => {
                    inner.entries.remove(&victim);
                    if self.config.collect_stats {
                        inner.evictions += 1;
                    }
                }
                None => break,
            }
        }

        inner.entries.insert(
            key,
            Entry { value, inserted_at: Instant::now(), last_used: tick, uses: 0 },
        );
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            entries: inner.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(capacity: usize, policy: EvictionPolicy) -> LayerConfig {
        LayerConfig { capacity, policy, ttl: None, collect_stats: true }
    }

    #[test]
    fn insert_then_get() {
        let cache = MathCache::new(config(4, EvictionPolicy::Lru));
        cache.insert("k".to_string(), 1.0);
        assert_eq!(cache.get(&"k".to_string()), Some(1.0));
        assert_eq!(cache.get(&"missing".to_string()), None);
    }

    #[test]
    fn zero_capacity_disables_the_layer() {
        let cache = MathCache::new(config(0, EvictionPolicy::Lru));
        cache.insert("k".to_string(), 1.0);
        assert_eq!(cache.get(&"k".to_string()), None);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache = MathCache::new(config(2, EvictionPolicy::Lru));
        cache.insert("a".to_string(), 1.0);
        cache.insert("b".to_string(), 2.0);
        // Touch "a" so "b" is the stalest
        cache.get(&"a".to_string());
        cache.insert("c".to_string(), 3.0);

        assert_eq!(cache.get(&"a".to_string()), Some(1.0));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"c".to_string()), Some(3.0));
    }

    #[test]
    fn lfu_evicts_least_frequently_used() {
        let cache = MathCache::new(config(2, EvictionPolicy::Lfu));
        cache.insert("a".to_string(), 1.0);
        cache.insert("b".to_string(), 2.0);
        // "a" becomes the hot entry
        cache.get(&"a".to_string());
        cache.get(&"a".to_string());
        cache.get(&"b".to_string());
        cache.insert("c".to_string(), 3.0);

        assert_eq!(cache.get(&"a".to_string()), Some(1.0));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn ttl_expires_from_insertion_time() {
        let cfg = LayerConfig {
            capacity: 4,
            policy: EvictionPolicy::Lru,
            ttl: Some(Duration::from_millis(10)),
            collect_stats: true,
        };
        let cache = MathCache::new(cfg);
        cache.insert("k".to_string(), 1.0);
        assert_eq!(cache.get(&"k".to_string()), Some(1.0));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"k".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn stats_count_monotonically() {
        let cache = MathCache::new(config(2, EvictionPolicy::Lru));
        cache.insert("a".to_string(), 1.0);
        cache.get(&"a".to_string());
        cache.get(&"a".to_string());
        cache.get(&"b".to_string());

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!(stats.hit_rate() > 0.6);
    }

    #[test]
    fn clear_empties_the_layer() {
        let cache = MathCache::new(config(4, EvictionPolicy::Lru));
        cache.insert("a".to_string(), 1.0);
        cache.clear();
        assert!(cache.is_empty());
    }
}
