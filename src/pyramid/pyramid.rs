//! The ordered set of levels covering a bounded region.

use crate::config::PyramidSettings;
use crate::geo::{LatLonDelta, Sector};
use crate::pyramid::{Level, PyramidError, TileAddress};
use std::sync::Arc;

/// A multi-resolution pyramid of tile levels.
///
/// Level `i` halves the angular tile size of level `i - 1`; all levels
/// cover the same bounding sector. The first `num_empty_levels` levels are
/// geometric placeholders named `"empty"`, used to reserve coarse levels
/// for datasets whose most detailed available data starts further down.
#[derive(Debug)]
pub struct LevelPyramid {
    sector: Sector,
    level_zero_tile_delta: LatLonDelta,
    num_empty_levels: u32,
    levels: Vec<Arc<Level>>,
}

impl LevelPyramid {
    /// Build a pyramid from validated settings.
    ///
    /// Fails fast on a degenerate sector, a non-positive tile delta, a zero
    /// level count, zero tile dimensions, or an empty-level count that
    /// leaves no populated level; nothing is partially constructed.
    pub fn new(settings: PyramidSettings) -> Result<Self, PyramidError> {
        if settings.sector.is_degenerate() {
            return Err(PyramidError::InvalidSector(settings.sector.to_string()));
        }
        if settings.level_zero_tile_delta.lat <= 0.0 || settings.level_zero_tile_delta.lon <= 0.0 {
            return Err(PyramidError::InvalidTileDelta {
                lat: settings.level_zero_tile_delta.lat,
                lon: settings.level_zero_tile_delta.lon,
            });
        }
        if settings.num_levels < 1 {
            return Err(PyramidError::InvalidLevelCount(settings.num_levels));
        }
        if settings.tile_width == 0 || settings.tile_height == 0 {
            return Err(PyramidError::InvalidTileDimension {
                width: settings.tile_width,
                height: settings.tile_height,
            });
        }
        if settings.num_empty_levels >= settings.num_levels {
            return Err(PyramidError::InvalidEmptyLevels {
                empty: settings.num_empty_levels,
                total: settings.num_levels,
            });
        }

        let mut levels = Vec::with_capacity(settings.num_levels as usize);
        for i in 0..settings.num_levels {
            let is_empty = i < settings.num_empty_levels;
            let name = if is_empty {
                "empty".to_string()
            } else {
                (i - settings.num_empty_levels).to_string()
            };
            levels.push(Arc::new(Level::new(
                i,
                name,
                &settings.data_cache_name,
                settings.level_zero_tile_delta.divided(i),
                settings.tile_width,
                settings.tile_height,
                is_empty,
                settings.retry,
            )));
        }

        tracing::debug!(
            levels = levels.len(),
            empty = settings.num_empty_levels,
            sector = %settings.sector,
            cache = %settings.data_cache_name,
            "Constructed level pyramid"
        );

        Ok(Self {
            sector: settings.sector,
            level_zero_tile_delta: settings.level_zero_tile_delta,
            num_empty_levels: settings.num_empty_levels,
            levels,
        })
    }

    /// The geographic extent covered by every level.
    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    /// Angular extent of one level-zero tile.
    pub fn level_zero_tile_delta(&self) -> LatLonDelta {
        self.level_zero_tile_delta
    }

    pub fn num_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Count of reserved empty levels at the top.
    pub fn num_levels_skipped(&self) -> u32 {
        self.num_empty_levels
    }

    /// The level with the given number, or `None` outside `[0, num_levels)`.
    pub fn level(&self, number: u32) -> Option<&Arc<Level>> {
        self.levels.get(number as usize)
    }

    /// The coarsest level.
    pub fn first_level(&self) -> &Arc<Level> {
        &self.levels[0]
    }

    /// The most detailed level.
    pub fn last_level(&self) -> &Arc<Level> {
        self.levels.last().expect("pyramid has at least one level")
    }

    /// Whether `number` addresses the most detailed level.
    pub fn is_final_level(&self, number: u32) -> bool {
        number == self.num_levels() - 1
    }

    /// The final level, only if the query sector intersects the pyramid's
    /// extent. Callers use this to refuse requests outside the declared
    /// coverage.
    pub fn last_level_for_sector(&self, sector: &Sector) -> Option<&Arc<Level>> {
        if self.sector.intersects(sector) {
            Some(self.last_level())
        } else {
            None
        }
    }

    /// The final level, only if the position lies inside the pyramid's
    /// extent.
    pub fn last_level_for_position(&self, lat: f64, lon: f64) -> Option<&Arc<Level>> {
        if self.sector.contains_point(lat, lon) {
            Some(self.last_level())
        } else {
            None
        }
    }

    /// Record a failed fetch for the addressed tile on its level's tracker.
    pub fn mark_absent(&self, address: &TileAddress) {
        if let Some(level) = self.level(address.level_number()) {
            level.mark_absent(address);
        }
    }

    /// Clear the addressed tile's failure record after a successful fetch.
    pub fn unmark_absent(&self, address: &TileAddress) {
        if let Some(level) = self.level(address.level_number()) {
            level.unmark_absent(address);
        }
    }

    /// Whether fetches for the addressed tile should be skipped right now.
    pub fn is_absent(&self, address: &TileAddress) -> bool {
        self.level(address.level_number())
            .map(|level| level.is_absent(address))
            .unwrap_or(false)
    }
}
