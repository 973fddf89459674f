//! Pure-function geometry used by the tile pyramid.
//!
//! Provides sector/angle arithmetic and spherical world-space points. The
//! rest of the crate treats these as a stateless geometry library; nothing
//! here touches tiles, caches, or the renderer.

mod point;
mod sector;

pub use point::{Vec3, EARTH_RADIUS_METERS};
pub use sector::{LatLonDelta, Sector};
