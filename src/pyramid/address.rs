//! Tile identity: pyramid level plus row and column.

use crate::pyramid::Level;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Immutable identity of one tile in a pyramid.
///
/// Two addresses are equal iff level number, level key, row, and column all
/// match. The hash over those four fields is computed once at construction,
/// since addresses are hashed on every cache probe of every frame.
///
/// The level key is shared with the owning [`Level`] by `Arc`, so probe
/// keys built with [`TileAddress::probe`] cost a refcount bump rather than
/// a string allocation. Probe keys are ordinary addresses and may be
/// stored, but callers probing a cache should prefer building a fresh one
/// per lookup over holding onto a shared scratch instance.
#[derive(Debug, Clone)]
pub struct TileAddress {
    level_number: u32,
    level_key: Arc<str>,
    row: u32,
    column: u32,
    hash: u64,
}

impl TileAddress {
    /// Create an address from its four identity fields.
    pub fn new(level_number: u32, level_key: Arc<str>, row: u32, column: u32) -> Self {
        let hash = Self::compute_hash(level_number, &level_key, row, column);
        Self {
            level_number,
            level_key,
            row,
            column,
            hash,
        }
    }

    /// Build a transient lookup key for a tile of the given level.
    ///
    /// Equivalent to `TileAddress::new` with the level's own key; exists so
    /// cache probes read as probes at the call site.
    pub fn probe(level: &Level, row: u32, column: u32) -> Self {
        Self::new(level.number(), level.key(), row, column)
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    pub fn level_key(&self) -> &str {
        &self.level_key
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    // FNV-1a over the identity fields. Stable within a process run, which
    // is all a cache key needs.
    fn compute_hash(level_number: u32, level_key: &str, row: u32, column: u32) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = FNV_OFFSET;
        let mut eat = |bytes: &[u8]| {
            for &b in bytes {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        };
        eat(&level_number.to_le_bytes());
        eat(level_key.as_bytes());
        eat(&row.to_le_bytes());
        eat(&column.to_le_bytes());
        hash
    }
}

impl PartialEq for TileAddress {
    fn eq(&self, other: &Self) -> bool {
        self.level_number == other.level_number
            && self.row == other.row
            && self.column == other.column
            && self.level_key == other.level_key
    }
}

impl Eq for TileAddress {}

impl Hash for TileAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialOrd for TileAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TileAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level_number
            .cmp(&other.level_number)
            .then_with(|| self.level_key.cmp(&other.level_key))
            .then_with(|| self.row.cmp(&other.row))
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.level_key, self.level_number, self.row, self.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn addr(level: u32, key: &str, row: u32, col: u32) -> TileAddress {
        TileAddress::new(level, Arc::from(key), row, col)
    }

    #[test]
    fn test_equality_all_fields() {
        let a = addr(2, "imagery/0", 4, 7);
        let b = addr(2, "imagery/0", 4, 7);
        assert_eq!(a, b);

        assert_ne!(a, addr(3, "imagery/0", 4, 7));
        assert_ne!(a, addr(2, "imagery/1", 4, 7));
        assert_ne!(a, addr(2, "imagery/0", 5, 7));
        assert_ne!(a, addr(2, "imagery/0", 4, 8));
    }

    #[test]
    fn test_hash_consistent_with_equality() {
        let mut set = HashSet::new();
        set.insert(addr(1, "elev/0", 2, 3));
        set.insert(addr(1, "elev/0", 2, 3));
        set.insert(addr(1, "elev/0", 3, 3));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&addr(1, "elev/0", 2, 3)));
    }

    #[test]
    fn test_hash_precomputed_once() {
        let a = addr(5, "imagery/3", 10, 20);
        let b = a.clone();
        assert_eq!(a.hash, b.hash);
        assert_eq!(
            a.hash,
            TileAddress::compute_hash(5, "imagery/3", 10, 20)
        );
    }

    #[test]
    fn test_ordering_level_major() {
        let mut v = vec![
            addr(1, "a", 0, 0),
            addr(0, "a", 9, 9),
            addr(0, "a", 0, 1),
            addr(0, "a", 0, 0),
        ];
        v.sort();
        assert_eq!(v[0], addr(0, "a", 0, 0));
        assert_eq!(v[1], addr(0, "a", 0, 1));
        assert_eq!(v[2], addr(0, "a", 9, 9));
        assert_eq!(v[3], addr(1, "a", 0, 0));
    }

    #[test]
    fn test_display() {
        let a = addr(2, "imagery/0", 4, 7);
        assert_eq!(format!("{}", a), "imagery/0/2/4/7");
    }
}
