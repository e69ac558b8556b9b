//! # Chunk Store
//!
//! Owns every materialized chunk and water plane, indexed by coordinate.
//!
//! ## Invariants
//!
//! - At most one loaded chunk per coordinate
//! - A water plane exists only alongside its chunk, and exactly when the
//!   chunk's lowest sample is below the water level
//! - Records live in pool slots; eviction returns the slot and releases the
//!   renderer handle

use std::collections::HashMap;
use std::sync::Arc;

use wildgrove_core::{PoolAllocator, PoolHandle};
use wildgrove_shared::{GroundProbe, Vec2, Vec3};

use crate::chunk::{ChunkCoord, ChunkRect, HeightmapTile};
use crate::config::GenerationConfig;
use crate::error::{StoreError, StoreResult};
use crate::render::{ChunkRenderer, RenderHandle};

/// A committed chunk.
#[derive(Debug)]
pub struct LoadedChunk {
    coord: ChunkCoord,
    tile: HeightmapTile,
    min_height: f32,
    max_height: f32,
    handle: RenderHandle,
}

impl LoadedChunk {
    /// Chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// The committed heightmap.
    #[must_use]
    pub const fn tile(&self) -> &HeightmapTile {
        &self.tile
    }

    /// Lowest normalized sample.
    #[must_use]
    pub const fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Highest normalized sample.
    #[must_use]
    pub const fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Renderer handle of the terrain object.
    #[must_use]
    pub const fn handle(&self) -> RenderHandle {
        self.handle
    }
}

/// A water plane over a chunk that dips below the water level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedWater {
    coord: ChunkCoord,
    /// World-space centre of the plane.
    center: Vec3,
    handle: RenderHandle,
}

impl LoadedWater {
    /// Chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Centre of the water plane; `y` is the surface height.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// World height of the surface.
    #[must_use]
    pub const fn surface_height(&self) -> f32 {
        self.center.y
    }

    /// Renderer handle of the water plane.
    #[must_use]
    pub const fn handle(&self) -> RenderHandle {
        self.handle
    }
}

#[derive(Debug, Clone, Copy)]
struct Slots {
    chunk: PoolHandle,
    water: Option<PoolHandle>,
}

/// Loaded chunks and water planes, keyed by coordinate.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use wildgrove_procedural::{
///     ChunkCoord, ChunkRect, ChunkStore, GenerationConfig, NullRenderer, TerrainSynthesizer,
/// };
///
/// let config = Arc::new(GenerationConfig::default());
/// let synth = TerrainSynthesizer::from_seed(config.seed);
/// let mut store = ChunkStore::new(Arc::clone(&config), 16);
/// let mut renderer = NullRenderer::new();
///
/// for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(5, 5)] {
///     let tile = synth.synthesize(coord, &config).unwrap();
///     store.commit(tile, &mut renderer).unwrap();
/// }
///
/// let evicted = store.evict_outside(&ChunkRect::centered(ChunkCoord::ORIGIN, 1), &mut renderer);
/// assert_eq!(evicted, vec![ChunkCoord::new(5, 5)]);
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug)]
pub struct ChunkStore {
    config: Arc<GenerationConfig>,
    chunks: PoolAllocator<LoadedChunk>,
    waters: PoolAllocator<LoadedWater>,
    index: HashMap<ChunkCoord, Slots>,
}

impl ChunkStore {
    /// Creates an empty store with `capacity` chunk slots (and as many water slots).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(config: Arc<GenerationConfig>, capacity: usize) -> Self {
        Self {
            config,
            chunks: PoolAllocator::new(capacity),
            waters: PoolAllocator::new(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Generation config tiles are interpreted with.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Chunk slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.capacity()
    }

    /// Number of loaded water planes.
    #[must_use]
    pub fn water_count(&self) -> usize {
        self.waters.allocated_count()
    }

    /// Returns true if `coord` is loaded.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.index.contains_key(&coord)
    }

    /// The loaded chunk at `coord`, if any.
    #[must_use]
    pub fn try_get(&self, coord: ChunkCoord) -> Option<&LoadedChunk> {
        let slots = self.index.get(&coord)?;
        self.chunks.get(slots.chunk)
    }

    /// The water plane at `coord`, if any.
    #[must_use]
    pub fn water(&self, coord: ChunkCoord) -> Option<&LoadedWater> {
        let slots = self.index.get(&coord)?;
        self.waters.get(slots.water?)
    }

    /// Every loaded coordinate, in no particular order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.index.keys().copied()
    }

    /// Every loaded chunk, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &LoadedChunk> {
        self.chunks.iter().map(|(_, chunk)| chunk)
    }

    /// Every loaded water plane, in no particular order.
    pub fn waters(&self) -> impl Iterator<Item = &LoadedWater> {
        self.waters.iter().map(|(_, water)| water)
    }

    /// Returns true if every chunk in the `side` x `side` square centred on
    /// `center` is loaded.
    #[must_use]
    pub fn is_area_loaded(&self, center: ChunkCoord, side: u32) -> bool {
        ChunkRect::centered(center, side / 2).iter().all(|coord| self.contains(coord))
    }

    /// Takes ownership of `tile` and materializes it.
    ///
    /// Derives the tile's height range, asks the renderer for the terrain
    /// object and, iff the lowest sample is below the water level, a water
    /// plane.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateChunk` if the tile's coordinate is already loaded
    /// - `StoreError::PoolExhausted` if no slot is free
    ///
    /// Nothing is materialized when an error is returned.
    pub fn commit<R: ChunkRenderer + ?Sized>(
        &mut self,
        tile: HeightmapTile,
        renderer: &mut R,
    ) -> StoreResult<&LoadedChunk> {
        let coord = tile.coord();
        if self.index.contains_key(&coord) {
            return Err(StoreError::DuplicateChunk(coord));
        }
        if self.chunks.is_full() || self.waters.is_full() {
            return Err(StoreError::PoolExhausted {
                coord,
                capacity: self.chunks.capacity(),
            });
        }

        let min_height = tile.min_height();
        let max_height = tile.max_height();
        let config = &*self.config;

        let water = if min_height < config.water_level {
            let half = config.chunk_extent() * 0.5;
            let record = LoadedWater {
                coord,
                center: Vec3::new(
                    coord.world_x(config.chunk_size) as f32 + half,
                    config.water_surface(),
                    coord.world_z(config.chunk_size) as f32 + half,
                ),
                handle: renderer.materialize_water(coord, &tile, config),
            };
            // Capacity was checked above.
            self.waters.try_allocate(record).ok()
        } else {
            None
        };

        let record = LoadedChunk {
            coord,
            handle: renderer.materialize_chunk(coord, &tile, config),
            tile,
            min_height,
            max_height,
        };
        let capacity = self.chunks.capacity();
        match self.chunks.try_insert(record) {
            Ok((chunk, stored)) => {
                self.index.insert(coord, Slots { chunk, water });
                Ok(&*stored)
            }
            Err(record) => {
                renderer.release(record.handle);
                if let Some(water) = water.and_then(|slot| self.waters.free(slot)) {
                    renderer.release(water.handle);
                }
                Err(StoreError::PoolExhausted { coord, capacity })
            }
        }
    }

    /// Unloads `coord`, releasing its terrain object and water plane.
    ///
    /// Returns false if it was not loaded.
    pub fn remove<R: ChunkRenderer + ?Sized>(&mut self, coord: ChunkCoord, renderer: &mut R) -> bool {
        let Some(slots) = self.index.remove(&coord) else {
            return false;
        };
        if let Some(water) = slots.water.and_then(|slot| self.waters.free(slot)) {
            renderer.release(water.handle);
        }
        if let Some(chunk) = self.chunks.free(slots.chunk) {
            renderer.release(chunk.handle);
        }
        true
    }

    /// Unloads every chunk outside `rect` and returns their coordinates,
    /// sorted.
    pub fn evict_outside<R: ChunkRenderer + ?Sized>(
        &mut self,
        rect: &ChunkRect,
        renderer: &mut R,
    ) -> Vec<ChunkCoord> {
        let mut evicted: Vec<ChunkCoord> = self.coords().filter(|coord| !rect.contains(*coord)).collect();
        evicted.sort_unstable();
        for &coord in &evicted {
            self.remove(coord, renderer);
        }
        evicted
    }

    /// Unloads everything.
    pub fn clear<R: ChunkRenderer + ?Sized>(&mut self, renderer: &mut R) {
        let all: Vec<ChunkCoord> = self.coords().collect();
        for coord in all {
            self.remove(coord, renderer);
        }
    }
}

impl GroundProbe for ChunkStore {
    /// Bilinear height over the loaded tile covering `(x, z)`.
    ///
    /// Returns 0 when that chunk is not loaded or the ground there is above
    /// `max_height`.
    fn ground_height(&self, x: f32, z: f32, max_height: f32) -> f32 {
        let size = self.config.chunk_size;
        let coord = ChunkCoord::containing(Vec2::new(x, z), size);
        let Some(chunk) = self.try_get(coord) else {
            return 0.0;
        };
        let u = x - coord.world_x(size) as f32;
        let v = z - coord.world_z(size) as f32;
        let height = chunk.tile.interpolate(u, v) * self.config.height as f32;
        if height > max_height {
            0.0
        } else {
            height
        }
    }
}
