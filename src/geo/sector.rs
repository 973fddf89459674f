//! Axis-aligned latitude/longitude bounding regions.

use std::fmt;

/// An axis-aligned geographic bounding region in degrees.
///
/// Latitude grows northward in `[-90, 90]`, longitude grows eastward in
/// `[-180, 180]`. A sector's edges are inclusive: two sectors that share
/// only an edge still intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

/// Per-tile angular extent in degrees (latitude span, longitude span).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonDelta {
    pub lat: f64,
    pub lon: f64,
}

impl LatLonDelta {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Halve both spans, producing the delta of the next finer level.
    pub fn halved(&self) -> Self {
        Self {
            lat: self.lat / 2.0,
            lon: self.lon / 2.0,
        }
    }

    /// The delta divided by `2^n`.
    pub fn divided(&self, n: u32) -> Self {
        // Computed in f64 so deep pyramids (n >= 32) stay exact; powers of
        // two are representable far beyond any practical level count.
        let divisor = 2f64.powi(n as i32);
        Self {
            lat: self.lat / divisor,
            lon: self.lon / divisor,
        }
    }
}

impl Sector {
    /// Create a sector from corner latitudes and longitudes in degrees.
    ///
    /// Callers are expected to pass `min <= max`; pyramid construction
    /// validates its bounding sector explicitly.
    pub fn from_degrees(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        debug_assert!(min_lat <= max_lat && min_lon <= max_lon);
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// The sector covering the whole sphere.
    pub fn full_sphere() -> Self {
        Self::from_degrees(-90.0, 90.0, -180.0, 180.0)
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Latitude span in degrees.
    pub fn delta_lat(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude span in degrees.
    pub fn delta_lon(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude of the sector's horizontal bisector.
    pub fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Longitude of the sector's vertical bisector.
    pub fn mid_lon(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }

    /// Whether the sector has zero area.
    pub fn is_degenerate(&self) -> bool {
        self.delta_lat() <= 0.0 || self.delta_lon() <= 0.0
    }

    /// Whether a geographic position lies inside the sector (inclusive).
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Whether another sector lies entirely inside this one (inclusive).
    pub fn contains_sector(&self, other: &Sector) -> bool {
        other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
            && other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
    }

    /// Whether two sectors overlap. Edge contact counts as overlap.
    pub fn intersects(&self, other: &Sector) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
    }

    /// The overlap of two sectors, or `None` if they are disjoint.
    pub fn intersection(&self, other: &Sector) -> Option<Sector> {
        if !self.intersects(other) {
            return None;
        }
        Some(Sector::from_degrees(
            self.min_lat.max(other.min_lat),
            self.max_lat.min(other.max_lat),
            self.min_lon.max(other.min_lon),
            self.max_lon.min(other.max_lon),
        ))
    }

    /// The smallest sector containing both inputs.
    pub fn union(&self, other: &Sector) -> Sector {
        Sector::from_degrees(
            self.min_lat.min(other.min_lat),
            self.max_lat.max(other.max_lat),
            self.min_lon.min(other.min_lon),
            self.max_lon.max(other.max_lon),
        )
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})..({}, {})",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
