//! In-memory tile cache with LRU eviction.

use crate::cache::TileCache;
use crate::pyramid::TileAddress;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Counters describing cache behavior since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entry_count: usize,
}

impl CacheStats {
    fn record_hit(&mut self) {
        self.hits += 1;
    }

    fn record_miss(&mut self) {
        self.misses += 1;
    }

    fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

struct CacheEntry<V> {
    value: V,
    /// Logical access time; larger is more recent.
    last_used: u64,
}

struct Inner<V> {
    entries: HashMap<TileAddress, CacheEntry<V>>,
    stats: CacheStats,
    tick: u64,
}

/// Entry-count-bounded cache with least-recently-used eviction.
///
/// Recency is tracked with a logical counter bumped on every access, so
/// behavior is deterministic under test. Values are cloned out on `get`;
/// callers store `Arc`s for anything non-trivial.
pub struct MemoryTileCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
}

impl<V: Clone + Send> MemoryTileCache<V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one; a cache that can hold nothing
    /// defeats the identity-reuse contract.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
                tick: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.entry_count = inner.entries.len();
        stats
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    fn evict_one(inner: &mut Inner<V>) {
        let oldest = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            inner.entries.remove(&key);
            inner.stats.record_eviction();
        }
    }
}

impl<V: Clone + Send> TileCache<V> for MemoryTileCache<V> {
    fn get(&self, key: &TileAddress) -> Option<V> {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.last_used = tick;
            let value = entry.value.clone();
            inner.stats.record_hit();
            Some(value)
        } else {
            inner.stats.record_miss();
            None
        }
    }

    fn put(&self, key: TileAddress, value: V) {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            Self::evict_one(&mut inner);
        }
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                last_used: tick,
            },
        );
    }

    fn contains(&self, key: &TileAddress) -> bool {
        self.inner.lock().entries.contains_key(key)
    }
}
