//! Geographic tiles: one cell of one pyramid level, with the
//! view-dependent subdivision decision.

mod factory;

pub use factory::{DefaultTileFactory, TileFactory};

use crate::cache::TileCache;
use crate::geo::{Sector, Vec3};
use crate::pyramid::{Level, TileAddress};
use parking_lot::Mutex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Corner and centroid points cached for one globe radius.
struct ReferencePoints {
    radius: f64,
    points: [Vec3; 5],
}

/// A geographic cell bound to one level, row, and column.
///
/// The tile's address and its world-space reference points are computed
/// lazily and cached: both are reused every frame, and the points are only
/// recomputed when the globe radius (vertical exaggeration) changes.
/// Equality and hashing go through the address.
pub struct Tile {
    sector: Sector,
    level: Arc<Level>,
    row: u32,
    column: u32,
    address: OnceLock<TileAddress>,
    reference_points: Mutex<Option<ReferencePoints>>,
}

impl Tile {
    pub fn new(sector: Sector, level: Arc<Level>, row: u32, column: u32) -> Self {
        Self {
            sector,
            level,
            row,
            column,
            address: OnceLock::new(),
            reference_points: Mutex::new(None),
        }
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// The tile's pyramid address, computed once.
    pub fn address(&self) -> &TileAddress {
        self.address.get_or_init(|| {
            TileAddress::new(self.level.number(), self.level.key(), self.row, self.column)
        })
    }

    /// Four corner points plus the centroid on a sphere of the given
    /// radius. Cached until the radius changes.
    pub fn reference_points(&self, radius: f64) -> [Vec3; 5] {
        let mut guard = self.reference_points.lock();
        if let Some(cached) = guard.as_ref() {
            if cached.radius == radius {
                return cached.points;
            }
        }
        let s = &self.sector;
        let points = [
            Vec3::from_geographic(s.min_lat(), s.min_lon(), radius),
            Vec3::from_geographic(s.min_lat(), s.max_lon(), radius),
            Vec3::from_geographic(s.max_lat(), s.min_lon(), radius),
            Vec3::from_geographic(s.max_lat(), s.max_lon(), radius),
            Vec3::from_geographic(s.mid_lat(), s.mid_lon(), radius),
        ];
        *guard = Some(ReferencePoints { radius, points });
        points
    }

    /// Whether the tile's resolution is too coarse for the given eye
    /// position.
    ///
    /// Finds the reference point nearest the eye and compares the
    /// world-space texel size there (`|point| * texel_height`) against the
    /// eye distance scaled by `10^(-detail_factor)`. A tie keeps the tile;
    /// only strictly oversized texels force a split. The comparison is
    /// viewport-independent, so large windows do not over-tile.
    pub fn must_subdivide(&self, eye: Vec3, detail_factor: f64, radius: f64) -> bool {
        let points = self.reference_points(radius);
        let mut nearest = points[0];
        let mut min_distance_sq = f64::MAX;
        for point in points {
            let d = point.distance_squared_to(eye);
            if d < min_distance_sq {
                min_distance_sq = d;
                nearest = point;
            }
        }
        let cell_height = nearest.length() * self.level.texel_height();
        cell_height > min_distance_sq.sqrt() * 10f64.powf(-detail_factor)
    }

    /// Produce this tile's four children on the next finer level.
    ///
    /// The parent sector is bisected at its mid latitude and longitude;
    /// children sit at rows `2r`/`2r+1` and columns `2c`/`2c+1`. Each
    /// child is looked up in the cache first so identity is preserved
    /// across frames; misses are built by the factory and are *not*
    /// inserted here. The caller caches the children it keeps.
    pub fn subdivide(
        &self,
        next_level: &Arc<Level>,
        cache: &dyn TileCache<Arc<Tile>>,
        factory: &dyn TileFactory,
    ) -> [Arc<Tile>; 4] {
        let s = &self.sector;
        let mid_lat = s.mid_lat();
        let mid_lon = s.mid_lon();
        let row2 = self.row * 2;
        let col2 = self.column * 2;

        let child = |sector: Sector, row: u32, column: u32| -> Arc<Tile> {
            let probe = TileAddress::probe(next_level, row, column);
            match cache.get(&probe) {
                Some(tile) => tile,
                None => factory.create_tile(sector, Arc::clone(next_level), row, column),
            }
        };

        [
            child(
                Sector::from_degrees(s.min_lat(), mid_lat, s.min_lon(), mid_lon),
                row2,
                col2,
            ),
            child(
                Sector::from_degrees(s.min_lat(), mid_lat, mid_lon, s.max_lon()),
                row2,
                col2 + 1,
            ),
            child(
                Sector::from_degrees(mid_lat, s.max_lat(), s.min_lon(), mid_lon),
                row2 + 1,
                col2,
            ),
            child(
                Sector::from_degrees(mid_lat, s.max_lat(), mid_lon, s.max_lon()),
                row2 + 1,
                col2 + 1,
            ),
        ]
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("level", &self.level.number())
            .field("row", &self.row)
            .field("column", &self.column)
            .field("sector", &self.sector)
            .finish_non_exhaustive()
    }
}
