//! Tile pyramid data model: addressing, levels, and the level pyramid.
//!
//! Row 0 sits at the south edge of the coordinate space and column 0 at
//! the west edge; a tile's row/column are relative to `-90`/`-180`, not to
//! the pyramid's bounding sector.

mod address;
mod error;
mod level;
#[allow(clippy::module_inception)]
mod pyramid;

pub use address::TileAddress;
pub use error::PyramidError;
pub use level::Level;
pub use pyramid::LevelPyramid;

use crate::geo::Sector;

/// Row index of the tile containing a latitude, for tiles `delta_lat`
/// degrees tall.
///
/// A latitude of exactly +90 maps to the last row rather than one past it,
/// so the positive boundary stays addressable.
pub fn compute_row(delta_lat: f64, latitude: f64) -> Result<u32, PyramidError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(PyramidError::LatitudeOutOfRange(latitude));
    }
    let row = if latitude == 90.0 {
        (180.0 / delta_lat).ceil() as i64 - 1
    } else {
        ((latitude + 90.0) / delta_lat).floor() as i64
    };
    Ok(row as u32)
}

/// Column index of the tile containing a longitude, for tiles `delta_lon`
/// degrees wide.
///
/// A longitude of exactly +180 maps to the last column, mirroring the
/// latitude boundary rule.
pub fn compute_column(delta_lon: f64, longitude: f64) -> Result<u32, PyramidError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(PyramidError::LongitudeOutOfRange(longitude));
    }
    let column = if longitude == 180.0 {
        (360.0 / delta_lon).ceil() as i64 - 1
    } else {
        ((longitude + 180.0) / delta_lon).floor() as i64
    };
    Ok(column as u32)
}

/// Minimum latitude of the given row.
pub fn row_latitude(delta_lat: f64, row: u32) -> f64 {
    f64::from(row) * delta_lat - 90.0
}

/// Minimum longitude of the given column.
pub fn column_longitude(delta_lon: f64, column: u32) -> f64 {
    f64::from(column) * delta_lon - 180.0
}

/// The geographic cell of a tile at `row`/`column` of the given level.
pub fn tile_sector(level: &Level, row: u32, column: u32) -> Sector {
    let delta = level.tile_delta();
    let min_lat = row_latitude(delta.lat, row);
    let min_lon = column_longitude(delta.lon, column);
    Sector::from_degrees(min_lat, min_lat + delta.lat, min_lon, min_lon + delta.lon)
}
