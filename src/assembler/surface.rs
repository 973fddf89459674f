//! Seams between the assembler and the things it draws.

use crate::geo::Sector;
use crate::assembler::AssemblerError;

/// Opaque summary of an object's render-affecting state.
///
/// Objects bump or rehash this whenever their geometry or style changes;
/// the assembler compares values, never interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey(pub u64);

/// An arbitrary geographic object the assembler can bind to tiles.
pub trait SurfaceObject: Send + Sync {
    /// The geographic regions the object occupies. An object spanning the
    /// antimeridian reports one sector per side. Empty means the object is
    /// skipped for this build.
    fn sectors(&self) -> Vec<Sector>;

    /// Current render-state summary, used for tile cache invalidation.
    fn state_key(&self) -> StateKey;

    /// Draw the object into a tile's raster surface.
    fn render(&self, sink: &mut dyn RasterSink);
}

/// One tile's raster surface.
///
/// Opaque to the assembler: it clears, lets objects draw, and hands the
/// surface to the caller. Pixel contents are never inspected.
pub trait RasterSink: Send {
    /// Reset the surface to fully transparent.
    fn clear(&mut self);

    /// Make the surface the active draw target.
    fn bind(&mut self);

    /// Edge length in pixels.
    fn dimension(&self) -> u32;
}

/// Produces raster surfaces for assembled tiles.
///
/// Allocation may fail under resource exhaustion; the assembler then drops
/// the tile from the current frame and retries on the next build.
pub trait RasterAllocator: Send + Sync {
    fn allocate(&self, dimension: u32) -> Result<Box<dyn RasterSink>, AssemblerError>;
}
