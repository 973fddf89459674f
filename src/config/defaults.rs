//! Default values for all configuration settings.
//!
//! Every tunable has a named constant here so defaults are reproducible
//! and visible in one place.

/// Consecutive fetch failures before a resource is treated as unavailable.
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 7;

/// Cooldown before an unavailable resource becomes eligible for one more
/// fetch attempt.
pub const DEFAULT_TRY_AGAIN_INTERVAL_MS: u64 = 60_000;

/// Edge length in pixels of assembled surface tiles. Power of two.
pub const DEFAULT_TILE_DIMENSION: u32 = 512;

/// Detail factor for the LOD decision, as a power-of-ten exponent.
pub const DEFAULT_DETAIL_FACTOR: f64 = 2.9;

/// Number of levels in assembler-owned pyramids.
pub const DEFAULT_NUM_LEVELS: u32 = 17;

/// Reserved empty levels at the top of a pyramid.
pub const DEFAULT_NUM_EMPTY_LEVELS: u32 = 0;

/// Level-zero tile angular span in degrees for assembler-owned pyramids.
pub const DEFAULT_LEVEL_ZERO_DELTA_DEGREES: f64 = 90.0;

/// Entry budget of the in-memory tile caches.
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 4096;
