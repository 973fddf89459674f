//! GeoPyramid - Multi-resolution geographic tile pyramids
//!
//! This library provides quadtree tile addressing over geographic sectors,
//! view-dependent level-of-detail selection, retry-limited tracking of
//! unavailable tiles, and an assembler that binds arbitrary surface
//! objects to rendered tiles.
//!
//! # High-Level API
//!
//! A pyramid is built from settings and then drives tile addressing and
//! subdivision:
//!
//! ```
//! use geopyramid::config::PyramidSettings;
//! use geopyramid::pyramid::LevelPyramid;
//!
//! let pyramid = LevelPyramid::new(PyramidSettings::full_sphere("imagery"))
//!     .expect("valid settings");
//! assert_eq!(pyramid.first_level().number(), 0);
//! ```

pub mod absent;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod geo;
pub mod loader;
pub mod logging;
pub mod pyramid;
pub mod tile;

/// Version of the GeoPyramid library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
