//! World-space point type used by the tile LOD decision.

/// Mean equatorial radius of the earth in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// A point in earth-centered, earth-fixed cartesian space (meters).
///
/// The z axis points through the north pole, the x axis through the
/// intersection of the equator and the prime meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Create a point from cartesian components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Compute the surface point for a geographic position on a sphere of
    /// the given radius.
    ///
    /// The radius already includes any vertical exaggeration applied by the
    /// caller's globe model.
    pub fn from_geographic(lat_deg: f64, lon_deg: f64, radius: f64) -> Self {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let cos_lat = lat.cos();
        Self {
            x: radius * cos_lat * lon.cos(),
            y: radius * cos_lat * lon.sin(),
            z: radius * lat.sin(),
        }
    }

    /// Distance from the coordinate origin (the globe center).
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Squared distance to another point.
    ///
    /// Used for nearest-point comparisons where the square root is not
    /// needed until a winner is chosen.
    pub fn distance_squared_to(&self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}
