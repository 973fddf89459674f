//! Shared pyramids for surface-object tiles, keyed by tile dimension.

use crate::config::{AssemblerSettings, PyramidSettings, RetrySettings};
use crate::geo::Sector;
use crate::pyramid::{LevelPyramid, PyramidError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of assembler-owned pyramids, one per tile dimension.
///
/// Independent assemblers using the same tile dimension share one pyramid
/// (and therefore one tile address space), so their caches reuse each
/// other's tiles. The registry is an explicit object created once by the
/// composing component and shared by `Arc`, not a process-wide static.
pub struct PyramidRegistry {
    settings: AssemblerSettings,
    pyramids: Mutex<HashMap<u32, Arc<LevelPyramid>>>,
}

impl PyramidRegistry {
    pub fn new(settings: AssemblerSettings) -> Self {
        Self {
            settings,
            pyramids: Mutex::new(HashMap::new()),
        }
    }

    /// The shared full-sphere pyramid for a tile dimension, created on
    /// first use.
    pub fn pyramid_for(&self, dimension: u32) -> Result<Arc<LevelPyramid>, PyramidError> {
        let mut pyramids = self.pyramids.lock();
        if let Some(pyramid) = pyramids.get(&dimension) {
            return Ok(Arc::clone(pyramid));
        }

        let pyramid = Arc::new(LevelPyramid::new(PyramidSettings {
            sector: Sector::full_sphere(),
            level_zero_tile_delta: self.settings.level_zero_tile_delta,
            num_levels: self.settings.num_levels,
            num_empty_levels: 0,
            tile_width: dimension,
            tile_height: dimension,
            data_cache_name: format!("surface-objects/{}", dimension),
            retry: RetrySettings::default(),
        })?);
        pyramids.insert(dimension, Arc::clone(&pyramid));
        tracing::debug!(dimension, "Created shared surface-tile pyramid");
        Ok(pyramid)
    }

    /// Number of pyramids created so far.
    pub fn len(&self) -> usize {
        self.pyramids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pyramids.lock().is_empty()
    }
}

impl std::fmt::Debug for PyramidRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyramidRegistry")
            .field("settings", &self.settings)
            .field("pyramids", &self.pyramids.lock().len())
            .finish_non_exhaustive()
    }
}
