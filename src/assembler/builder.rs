//! Resolution-adaptive binding of surface objects to rendered tiles.

use crate::assembler::{
    AssemblerError, PyramidRegistry, RasterAllocator, RasterSink, StateKey, SurfaceObject,
};
use crate::cache::{MemoryTileCache, TileCache};
use crate::config::AssemblerSettings;
use crate::geo::{Sector, Vec3, EARTH_RADIUS_METERS};
use crate::pyramid::{self, Level, LevelPyramid, TileAddress};
use crate::tile::{DefaultTileFactory, Tile, TileFactory};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// The viewpoint a build assembles tiles for.
#[derive(Debug, Clone)]
pub struct View {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Geographic region currently visible.
    pub visible_sector: Sector,
    /// Active pick regions; tiles touching any of them are kept even when
    /// outside the visible sector.
    pub pick_sectors: Vec<Sector>,
    /// Viewport size in pixels; clamps the tile dimension.
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Globe radius including vertical exaggeration.
    pub globe_radius: f64,
}

impl View {
    pub fn new(eye: Vec3, visible_sector: Sector, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            eye,
            visible_sector,
            pick_sectors: Vec::new(),
            viewport_width,
            viewport_height,
            globe_radius: EARTH_RADIUS_METERS,
        }
    }

    pub fn with_pick_sectors(mut self, pick_sectors: Vec<Sector>) -> Self {
        self.pick_sectors = pick_sectors;
        self
    }

    pub fn with_globe_radius(mut self, globe_radius: f64) -> Self {
        self.globe_radius = globe_radius;
        self
    }
}

/// Tile content identity: which objects intersect, in which state.
///
/// Comparing the full ordered key list (rather than a hash of it) rules
/// out both stale visuals from collisions and redundant re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContentKey {
    address: TileAddress,
    object_keys: Vec<StateKey>,
}

/// Rendered raster plus the content key it was rendered for.
///
/// Lives in the rendered-tile cache across builds; the key is `None` until
/// the first render completes.
pub struct RenderedTile {
    content_key: Mutex<Option<ContentKey>>,
    raster: Mutex<Box<dyn RasterSink>>,
}

impl RenderedTile {
    fn new(raster: Box<dyn RasterSink>) -> Self {
        Self {
            content_key: Mutex::new(None),
            raster: Mutex::new(raster),
        }
    }
}

impl std::fmt::Debug for RenderedTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedTile")
            .field("rendered", &self.content_key.lock().is_some())
            .finish_non_exhaustive()
    }
}

/// One leaf tile of a finished build: the quadtree cell and its raster.
///
/// Holds no object references, so dropping a result never pins objects in
/// the cache.
#[derive(Clone)]
pub struct SurfaceTile {
    tile: Arc<Tile>,
    state: Arc<RenderedTile>,
}

impl SurfaceTile {
    pub fn tile(&self) -> &Arc<Tile> {
        &self.tile
    }

    pub fn address(&self) -> &TileAddress {
        self.tile.address()
    }

    pub fn sector(&self) -> &Sector {
        self.tile.sector()
    }

    /// The tile's raster surface, for binding and drawing.
    pub fn raster(&self) -> &Mutex<Box<dyn RasterSink>> {
        &self.state.raster
    }
}

impl std::fmt::Debug for SurfaceTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceTile")
            .field("address", self.tile.address())
            .finish_non_exhaustive()
    }
}

/// Counters from the most recent build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Leaf tiles in the result.
    pub tiles_assembled: usize,
    /// Leaves whose content was re-rendered.
    pub tiles_rendered: usize,
    /// Leaves served unchanged from the rendered-tile cache.
    pub cache_hits: usize,
    /// Leaves dropped because no raster surface could be allocated.
    pub tiles_dropped: usize,
}

/// Transient per-build record for one tile under consideration.
struct WorkingTile {
    tile: Arc<Tile>,
    /// Indices into the build's object slice. An object appears at most
    /// once.
    objects: Vec<usize>,
    /// Union of the intersecting objects' sectors.
    bounding: Option<Sector>,
}

/// Assembles a minimal covering set of tiles for a set of surface objects.
///
/// `build` runs once per frame on the render thread and takes `&mut self`;
/// it is not reentrant. The tile-identity and rendered-tile caches are
/// safe for concurrent reads from other threads.
pub struct ObjectTileAssembler {
    settings: AssemblerSettings,
    registry: Arc<PyramidRegistry>,
    allocator: Arc<dyn RasterAllocator>,
    factory: Arc<dyn TileFactory>,
    tile_cache: Arc<dyn TileCache<Arc<Tile>>>,
    rendered_cache: Arc<dyn TileCache<Arc<RenderedTile>>>,
    last_stats: BuildStats,
}

impl ObjectTileAssembler {
    pub fn new(
        settings: AssemblerSettings,
        registry: Arc<PyramidRegistry>,
        allocator: Arc<dyn RasterAllocator>,
    ) -> Self {
        let capacity = settings.tile_cache_capacity;
        let tile_cache: Arc<MemoryTileCache<Arc<Tile>>> = Arc::new(MemoryTileCache::new(capacity));
        let rendered_cache: Arc<MemoryTileCache<Arc<RenderedTile>>> =
            Arc::new(MemoryTileCache::new(capacity));
        Self {
            settings,
            registry,
            allocator,
            factory: Arc::new(DefaultTileFactory::new()),
            tile_cache,
            rendered_cache,
            last_stats: BuildStats::default(),
        }
    }

    /// Replace the tile factory, e.g. to attach per-tile state.
    pub fn with_factory(mut self, factory: Arc<dyn TileFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Share a tile-identity cache with other components.
    pub fn with_tile_cache(mut self, cache: Arc<dyn TileCache<Arc<Tile>>>) -> Self {
        self.tile_cache = cache;
        self
    }

    /// Share a rendered-tile cache with other components.
    pub fn with_rendered_cache(mut self, cache: Arc<dyn TileCache<Arc<RenderedTile>>>) -> Self {
        self.rendered_cache = cache;
        self
    }

    /// Counters from the most recent `build` call.
    pub fn last_build_stats(&self) -> BuildStats {
        self.last_stats
    }

    /// Assemble tiles covering `objects` at a resolution adequate for
    /// `view`.
    ///
    /// Per-object and per-tile failures are isolated: a failing tile is
    /// logged and dropped from this frame's result, the rest of the build
    /// continues.
    pub fn build(
        &mut self,
        view: &View,
        objects: &[Arc<dyn SurfaceObject>],
    ) -> Result<Vec<SurfaceTile>, AssemblerError> {
        let mut stats = BuildStats::default();
        let dimension = clamp_tile_dimension(
            self.settings.tile_dimension,
            view.viewport_width,
            view.viewport_height,
        );
        let pyramid = self.registry.pyramid_for(dimension)?;

        // Snapshot geometry and state keys once; objects may recompute
        // them on every call.
        let object_sectors: Vec<Vec<Sector>> = objects.iter().map(|o| o.sectors()).collect();
        let state_keys: Vec<StateKey> = objects.iter().map(|o| o.state_key()).collect();

        let mut top_tiles = self.index_into_top_tiles(&pyramid, objects.len(), &object_sectors);
        // HashMap order is arbitrary; keep descent order stable across
        // frames.
        top_tiles.sort_by(|a, b| a.tile.address().cmp(b.tile.address()));

        let mut result = Vec::new();
        for working in top_tiles {
            self.descend(
                &pyramid,
                view,
                dimension,
                objects,
                &object_sectors,
                &state_keys,
                working.tile,
                working.objects,
                working.bounding,
                &mut result,
                &mut stats,
            );
        }

        tracing::debug!(
            tiles = stats.tiles_assembled,
            rendered = stats.tiles_rendered,
            cache_hits = stats.cache_hits,
            dropped = stats.tiles_dropped,
            dimension,
            "Assembled surface tiles"
        );
        self.last_stats = stats;
        Ok(result)
    }

    /// Step 2: assign every object to the top-level tiles it overlaps.
    fn index_into_top_tiles(
        &self,
        pyramid: &LevelPyramid,
        object_count: usize,
        object_sectors: &[Vec<Sector>],
    ) -> Vec<WorkingTile> {
        let top_level = pyramid.first_level();
        let mut working: HashMap<TileAddress, WorkingTile> = HashMap::new();

        for index in 0..object_count {
            let sectors = &object_sectors[index];
            if sectors.is_empty() {
                tracing::debug!(object = index, "Surface object reports no sectors, skipped");
                continue;
            }
            for sector in sectors {
                let Some(overlap) = sector.intersection(pyramid.sector()) else {
                    continue;
                };
                let range = match top_tile_range(&overlap, top_level) {
                    Ok(range) => range,
                    Err(err) => {
                        tracing::warn!(object = index, error = %err, "Object sector not addressable, skipped");
                        continue;
                    }
                };
                let (row_min, row_max, col_min, col_max) = range;
                for row in row_min..=row_max {
                    for column in col_min..=col_max {
                        let address = TileAddress::probe(top_level, row, column);
                        let entry = working.entry(address).or_insert_with(|| WorkingTile {
                            tile: self.top_level_tile(top_level, row, column),
                            objects: Vec::new(),
                            bounding: None,
                        });
                        // All of an object's sectors are processed before
                        // the next object, so a duplicate match (e.g. an
                        // antimeridian-spanning object whose two sectors
                        // land in the same cell) is always the list tail.
                        if entry.objects.last() != Some(&index) {
                            entry.objects.push(index);
                        }
                        entry.bounding = Some(match entry.bounding {
                            Some(bounding) => bounding.union(sector),
                            None => *sector,
                        });
                    }
                }
            }
        }

        working.into_values().collect()
    }

    /// Fetch-or-create a top-level tile. Not inserted into the cache here;
    /// the descent caches the tiles it keeps.
    fn top_level_tile(&self, level: &Arc<Level>, row: u32, column: u32) -> Arc<Tile> {
        let probe = TileAddress::probe(level, row, column);
        if let Some(tile) = self.tile_cache.get(&probe) {
            return tile;
        }
        let sector = pyramid::tile_sector(level, row, column);
        self.factory.create_tile(sector, Arc::clone(level), row, column)
    }

    /// Step 3: recursive descent to adequate resolution.
    #[allow(clippy::too_many_arguments)]
    fn descend(
        &self,
        pyramid: &LevelPyramid,
        view: &View,
        dimension: u32,
        objects: &[Arc<dyn SurfaceObject>],
        object_sectors: &[Vec<Sector>],
        state_keys: &[StateKey],
        tile: Arc<Tile>,
        tile_objects: Vec<usize>,
        bounding: Option<Sector>,
        result: &mut Vec<SurfaceTile>,
        stats: &mut BuildStats,
    ) {
        let visible = tile.sector().intersects(&view.visible_sector)
            || view
                .pick_sectors
                .iter()
                .any(|pick| tile.sector().intersects(pick));
        if !visible {
            return;
        }
        if tile_objects.is_empty() {
            return;
        }

        // The tile is kept for this frame; only now does its identity earn
        // a cache slot, so discarded tiles never crowd out kept ones.
        self.tile_cache.put(tile.address().clone(), Arc::clone(&tile));

        let level_number = tile.level().number();
        let is_leaf = pyramid.is_final_level(level_number)
            || !tile.must_subdivide(view.eye, self.settings.detail_factor, view.globe_radius);
        if is_leaf {
            self.render_leaf(dimension, objects, state_keys, tile, &tile_objects, result, stats);
            return;
        }

        let Some(next_level) = pyramid.level(level_number + 1) else {
            // Unreachable given the final-level check; keep the tile
            // rather than lose coverage.
            self.render_leaf(dimension, objects, state_keys, tile, &tile_objects, result, stats);
            return;
        };

        let children = tile.subdivide(next_level, self.tile_cache.as_ref(), self.factory.as_ref());
        for child in children {
            let (child_objects, child_bounding) =
                inherit_objects(child.sector(), &tile_objects, bounding, object_sectors);
            self.descend(
                pyramid,
                view,
                dimension,
                objects,
                object_sectors,
                state_keys,
                child,
                child_objects,
                child_bounding,
                result,
                stats,
            );
        }
    }

    /// Step 4: render a kept leaf, or reuse its cached content.
    fn render_leaf(
        &self,
        dimension: u32,
        objects: &[Arc<dyn SurfaceObject>],
        state_keys: &[StateKey],
        tile: Arc<Tile>,
        tile_objects: &[usize],
        result: &mut Vec<SurfaceTile>,
        stats: &mut BuildStats,
    ) {
        let address = tile.address().clone();
        let content_key = ContentKey {
            address: address.clone(),
            object_keys: tile_objects.iter().map(|&i| state_keys[i]).collect(),
        };

        let state = match self.rendered_cache.get(&address) {
            Some(state) => state,
            None => match self.allocator.allocate(dimension) {
                Ok(raster) => {
                    let state = Arc::new(RenderedTile::new(raster));
                    self.rendered_cache.put(address.clone(), Arc::clone(&state));
                    state
                }
                Err(err) => {
                    tracing::warn!(
                        address = %address,
                        error = %err,
                        "Raster allocation failed, tile dropped for this frame"
                    );
                    stats.tiles_dropped += 1;
                    return;
                }
            },
        };

        let mut key_guard = state.content_key.lock();
        if key_guard.as_ref() == Some(&content_key) {
            stats.cache_hits += 1;
        } else {
            let mut raster = state.raster.lock();
            raster.clear();
            // List order is draw order: later objects draw over earlier.
            for &index in tile_objects {
                objects[index].render(&mut **raster);
            }
            *key_guard = Some(content_key);
            stats.tiles_rendered += 1;
        }
        drop(key_guard);

        stats.tiles_assembled += 1;
        result.push(SurfaceTile { tile, state });
    }
}

impl std::fmt::Debug for ObjectTileAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectTileAssembler")
            .field("settings", &self.settings)
            .field("last_stats", &self.last_stats)
            .finish_non_exhaustive()
    }
}

/// Step 3b: the subset of the parent's objects relevant to one child.
///
/// When the child's sector contains the parent's whole object-bounding
/// sector every object is inherited without per-object tests.
fn inherit_objects(
    child_sector: &Sector,
    parent_objects: &[usize],
    parent_bounding: Option<Sector>,
    object_sectors: &[Vec<Sector>],
) -> (Vec<usize>, Option<Sector>) {
    if let Some(bounding) = parent_bounding {
        if child_sector.contains_sector(&bounding) {
            return (parent_objects.to_vec(), parent_bounding);
        }
    }

    let mut objects = Vec::new();
    let mut bounding: Option<Sector> = None;
    for &index in parent_objects {
        let mut intersects = false;
        for sector in &object_sectors[index] {
            if sector.intersects(child_sector) {
                intersects = true;
                bounding = Some(match bounding {
                    Some(b) => b.union(sector),
                    None => *sector,
                });
            }
        }
        if intersects {
            objects.push(index);
        }
    }
    (objects, bounding)
}

/// Row/column range of top-level tiles a sector overlaps.
fn top_tile_range(
    sector: &Sector,
    level: &Level,
) -> Result<(u32, u32, u32, u32), crate::pyramid::PyramidError> {
    let delta = level.tile_delta();
    let row_min = pyramid::compute_row(delta.lat, sector.min_lat())?;
    let row_max = pyramid::compute_row(delta.lat, sector.max_lat())?;
    let col_min = pyramid::compute_column(delta.lon, sector.min_lon())?;
    let col_max = pyramid::compute_column(delta.lon, sector.max_lon())?;
    Ok((row_min, row_max, col_min, col_max))
}

/// Largest power of two not exceeding `value` (minimum 1).
fn floor_power_of_two(value: u32) -> u32 {
    if value == 0 {
        1
    } else {
        1 << (31 - value.leading_zeros())
    }
}

/// The effective tile dimension: the requested power of two, clamped to
/// the viewport's smaller side.
pub(crate) fn clamp_tile_dimension(requested: u32, viewport_width: u32, viewport_height: u32) -> u32 {
    let requested = floor_power_of_two(requested.max(1));
    let smaller = viewport_width.min(viewport_height).max(1);
    requested.min(floor_power_of_two(smaller))
}
