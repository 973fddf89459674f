//! Tile caching: the cache seam plus an in-memory implementation.
//!
//! The same seam stores two kinds of values: `Arc<Tile>` for quadtree
//! identity reuse across frames, and rendered-tile state for the
//! assembler. Duplicate-key races are last-write-wins; tile construction
//! is idempotent by value, so nothing stronger is needed.

mod memory;

pub use memory::{CacheStats, MemoryTileCache};

use crate::pyramid::TileAddress;

/// Key-value cache for per-tile values.
///
/// Implementations must support concurrent `get`/`put` from fetch-worker
/// threads and the render thread.
pub trait TileCache<V>: Send + Sync {
    /// Look up the value for an address, `None` on a miss.
    fn get(&self, key: &TileAddress) -> Option<V>;

    /// Store a value. An existing entry for the key is replaced.
    fn put(&self, key: TileAddress, value: V);

    /// Whether the address currently has an entry.
    fn contains(&self, key: &TileAddress) -> bool;
}

/// Cache that never stores anything.
///
/// Useful for measuring the cost of caching and for tests that want every
/// lookup to miss.
#[derive(Debug, Clone, Default)]
pub struct NoOpTileCache;

impl NoOpTileCache {
    pub fn new() -> Self {
        Self
    }
}

impl<V: Send> TileCache<V> for NoOpTileCache {
    fn get(&self, _key: &TileAddress) -> Option<V> {
        None
    }

    fn put(&self, _key: TileAddress, _value: V) {}

    fn contains(&self, _key: &TileAddress) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(row: u32, col: u32) -> TileAddress {
        TileAddress::new(0, Arc::from("test/0"), row, col)
    }

    #[test]
    fn test_noop_cache_always_misses() {
        let cache = NoOpTileCache::new();
        TileCache::put(&cache, key(1, 1), 42u32);
        assert_eq!(TileCache::<u32>::get(&cache, &key(1, 1)), None);
        assert!(!TileCache::<u32>::contains(&cache, &key(1, 1)));
    }
}
