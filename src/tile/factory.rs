//! Tile construction seam.

use crate::geo::Sector;
use crate::pyramid::Level;
use crate::tile::Tile;
use std::sync::Arc;

/// Constructs tiles on behalf of the quadtree.
///
/// Subdivision and top-level indexing go through this trait so callers can
/// attach their own per-tile state without the quadtree knowing what a
/// tile ultimately renders. Factories must not insert the tile into any
/// cache; that is the caller's decision once the tile is kept.
pub trait TileFactory: Send + Sync {
    fn create_tile(&self, sector: Sector, level: Arc<Level>, row: u32, column: u32) -> Arc<Tile>;
}

/// Factory producing plain [`Tile`]s.
#[derive(Debug, Clone, Default)]
pub struct DefaultTileFactory;

impl DefaultTileFactory {
    pub fn new() -> Self {
        Self
    }
}

impl TileFactory for DefaultTileFactory {
    fn create_tile(&self, sector: Sector, level: Arc<Level>, row: u32, column: u32) -> Arc<Tile> {
        Arc::new(Tile::new(sector, level, row, column))
    }
}
