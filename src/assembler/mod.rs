//! Binding of arbitrary surface objects to the tile pyramid.
//!
//! Each frame, [`ObjectTileAssembler::build`] covers the supplied objects
//! with the fewest tiles whose resolution satisfies the view, rendering
//! only tiles whose content changed since the previous frame.

mod builder;
mod error;
mod registry;
mod surface;

pub use builder::{BuildStats, ObjectTileAssembler, RenderedTile, SurfaceTile, View};
pub use error::AssemblerError;
pub use registry::PyramidRegistry;
pub use surface::{RasterAllocator, RasterSink, StateKey, SurfaceObject};
