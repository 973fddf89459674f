//! Settings structs for pyramid, retry, and assembler configuration.
//!
//! Pure data types with `Default` impls and `with_*` builders; validation
//! happens where the values are consumed (pyramid construction).

use super::defaults::*;
use crate::geo::{LatLonDelta, Sector};
use std::time::Duration;

/// Retry-limiting parameters for absent-resource tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    /// Failed attempts before a resource is considered unavailable (>= 1).
    pub attempt_limit: u32,
    /// Cooldown before an unavailable resource may be attempted again.
    pub try_again_interval: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempt_limit: DEFAULT_ATTEMPT_LIMIT,
            try_again_interval: Duration::from_millis(DEFAULT_TRY_AGAIN_INTERVAL_MS),
        }
    }
}

impl RetrySettings {
    pub fn with_attempt_limit(mut self, limit: u32) -> Self {
        self.attempt_limit = limit;
        self
    }

    pub fn with_try_again_interval(mut self, interval: Duration) -> Self {
        self.try_again_interval = interval;
        self
    }
}

/// Parameters describing one tile pyramid.
#[derive(Debug, Clone)]
pub struct PyramidSettings {
    /// Geographic extent covered by every level.
    pub sector: Sector,
    /// Angular span of one level-zero tile.
    pub level_zero_tile_delta: LatLonDelta,
    /// Total number of levels, including empty ones (>= 1).
    pub num_levels: u32,
    /// Levels reserved at the top for datasets whose most detailed
    /// available data starts below level zero.
    pub num_empty_levels: u32,
    /// Tile width in pixels (> 0).
    pub tile_width: u32,
    /// Tile height in pixels (> 0).
    pub tile_height: u32,
    /// Dataset name used as the cache-key prefix of every level.
    pub data_cache_name: String,
    /// Retry limiting applied to each level's absent-tile tracker.
    pub retry: RetrySettings,
}

impl PyramidSettings {
    /// Settings for a full-sphere pyramid with square tiles.
    pub fn full_sphere(data_cache_name: impl Into<String>) -> Self {
        Self {
            sector: Sector::full_sphere(),
            level_zero_tile_delta: LatLonDelta::new(
                DEFAULT_LEVEL_ZERO_DELTA_DEGREES,
                DEFAULT_LEVEL_ZERO_DELTA_DEGREES,
            ),
            num_levels: DEFAULT_NUM_LEVELS,
            num_empty_levels: DEFAULT_NUM_EMPTY_LEVELS,
            tile_width: DEFAULT_TILE_DIMENSION,
            tile_height: DEFAULT_TILE_DIMENSION,
            data_cache_name: data_cache_name.into(),
            retry: RetrySettings::default(),
        }
    }

    pub fn with_sector(mut self, sector: Sector) -> Self {
        self.sector = sector;
        self
    }

    pub fn with_level_zero_tile_delta(mut self, delta: LatLonDelta) -> Self {
        self.level_zero_tile_delta = delta;
        self
    }

    pub fn with_num_levels(mut self, num_levels: u32) -> Self {
        self.num_levels = num_levels;
        self
    }

    pub fn with_num_empty_levels(mut self, num_empty_levels: u32) -> Self {
        self.num_empty_levels = num_empty_levels;
        self
    }

    pub fn with_tile_dimensions(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }
}

/// Parameters for the surface-object tile assembler.
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    /// Requested edge length of assembled tiles in pixels. Rounded down to
    /// a power of two and clamped to the viewport's smaller side.
    pub tile_dimension: u32,
    /// LOD detail factor (power-of-ten exponent).
    pub detail_factor: f64,
    /// Levels in the pyramids the assembler derives per tile dimension.
    pub num_levels: u32,
    /// Level-zero tile span of those pyramids.
    pub level_zero_tile_delta: LatLonDelta,
    /// Entry budget for the tile-identity and rendered-tile caches.
    pub tile_cache_capacity: usize,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            tile_dimension: DEFAULT_TILE_DIMENSION,
            detail_factor: DEFAULT_DETAIL_FACTOR,
            num_levels: DEFAULT_NUM_LEVELS,
            level_zero_tile_delta: LatLonDelta::new(
                DEFAULT_LEVEL_ZERO_DELTA_DEGREES,
                DEFAULT_LEVEL_ZERO_DELTA_DEGREES,
            ),
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
        }
    }
}

impl AssemblerSettings {
    pub fn with_tile_dimension(mut self, dimension: u32) -> Self {
        self.tile_dimension = dimension;
        self
    }

    pub fn with_detail_factor(mut self, detail_factor: f64) -> Self {
        self.detail_factor = detail_factor;
        self
    }

    pub fn with_num_levels(mut self, num_levels: u32) -> Self {
        self.num_levels = num_levels;
        self
    }

    pub fn with_level_zero_tile_delta(mut self, delta: LatLonDelta) -> Self {
        self.level_zero_tile_delta = delta;
        self
    }
}
