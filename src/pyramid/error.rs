//! Error types for pyramid construction and tile addressing.

use thiserror::Error;

/// Errors raised by pyramid construction and addressing operations.
///
/// Construction errors are fatal and leave nothing partially built; the
/// out-of-range variants indicate a caller bug in an addressing call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PyramidError {
    /// Bounding sector has zero area.
    #[error("Bounding sector is degenerate: {0}")]
    InvalidSector(String),

    /// Level-zero tile delta must be positive in both axes.
    #[error("Invalid level-zero tile delta: lat={lat}, lon={lon}")]
    InvalidTileDelta { lat: f64, lon: f64 },

    /// A pyramid needs at least one level.
    #[error("Invalid level count: {0} (must be >= 1)")]
    InvalidLevelCount(u32),

    /// Tile pixel dimensions must be positive.
    #[error("Invalid tile dimensions: {width}x{height} (must be > 0)")]
    InvalidTileDimension { width: u32, height: u32 },

    /// Empty-level count must leave at least one populated level.
    #[error("Invalid empty level count: {empty} of {total} levels")]
    InvalidEmptyLevels { empty: u32, total: u32 },

    /// Latitude outside `[-90, 90]`.
    #[error("Latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside `[-180, 180]`.
    #[error("Longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}
