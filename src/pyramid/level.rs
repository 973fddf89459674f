//! One resolution tier of a tile pyramid.

use crate::absent::AbsentTracker;
use crate::config::RetrySettings;
use crate::geo::LatLonDelta;
use crate::pyramid::TileAddress;
use std::fmt;
use std::sync::Arc;

/// One level of a [`LevelPyramid`](crate::pyramid::LevelPyramid).
///
/// Carries the level's angular tile size, pixel dimensions, derived texel
/// height, cache-key prefix, and the absent-tile tracker for resources of
/// this level. Levels are shared by `Arc` between the pyramid and every
/// tile bound to them.
pub struct Level {
    number: u32,
    name: String,
    key: Arc<str>,
    tile_delta: LatLonDelta,
    tile_width: u32,
    tile_height: u32,
    texel_height: f64,
    is_empty: bool,
    absent: AbsentTracker<TileAddress>,
}

impl Level {
    /// Build a level. Called by pyramid construction, which has already
    /// validated the inputs.
    pub(crate) fn new(
        number: u32,
        name: String,
        data_cache_name: &str,
        tile_delta: LatLonDelta,
        tile_width: u32,
        tile_height: u32,
        is_empty: bool,
        retry: RetrySettings,
    ) -> Self {
        let key: Arc<str> = Arc::from(format!("{}/{}", data_cache_name, name));
        // World-space angular size of one vertical pixel.
        let texel_height = tile_delta.lat.to_radians() / f64::from(tile_height);
        Self {
            number,
            name,
            key,
            tile_delta,
            tile_width,
            tile_height,
            texel_height,
            is_empty,
            absent: AbsentTracker::new(retry),
        }
    }

    /// Ordinal of this level within its pyramid, level 0 coarsest.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Dataset-relative name: `"empty"` for reserved levels, otherwise the
    /// ordinal among populated levels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cache-key prefix: `data_cache_name + "/" + name`.
    pub fn key(&self) -> Arc<str> {
        Arc::clone(&self.key)
    }

    /// Angular extent of one tile at this level.
    pub fn tile_delta(&self) -> LatLonDelta {
        self.tile_delta
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Radians of latitude covered by one vertical pixel.
    pub fn texel_height(&self) -> f64 {
        self.texel_height
    }

    /// Whether this level only reserves geometry and never holds data.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Record a failed fetch for a tile of this level.
    pub fn mark_absent(&self, address: &TileAddress) {
        self.absent.record_failure(address);
    }

    /// Record a successful fetch, clearing the tile's failure record.
    pub fn unmark_absent(&self, address: &TileAddress) {
        self.absent.mark_available(address);
    }

    /// Whether fetches for the tile should be skipped right now.
    pub fn is_absent(&self, address: &TileAddress) -> bool {
        self.absent.is_absent(address)
    }

    /// The level's absent-tile tracker.
    pub fn absent_tiles(&self) -> &AbsentTracker<TileAddress> {
        &self.absent
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("number", &self.number)
            .field("name", &self.name)
            .field("tile_delta", &self.tile_delta)
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .field("is_empty", &self.is_empty)
            .finish_non_exhaustive()
    }
}
