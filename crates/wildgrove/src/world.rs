//! # World Terrain Oracle
//!
//! Answers the pathfinder's questions from streamed terrain:
//!
//! - ground height comes from the loaded heightmaps in the `ChunkStore`
//! - a probe is blocked over water, over terrain that is not streamed in,
//!   and on cells the host registered as blocked (trees, rocks)
//!
//! The oracle only borrows its sources. Build one per tick, after the
//! streamer has committed that tick's tiles.

use wildgrove_navigation::{BlockedCells, GridPos};
use wildgrove_procedural::{ChunkCoord, ChunkStore};
use wildgrove_shared::{GroundProbe, ObstacleProbe, Vec2, Vec3};

/// Terrain, water and host obstacles as one pathfinding oracle.
#[derive(Debug, Clone, Copy)]
pub struct WorldTerrainOracle<'a> {
    store: &'a ChunkStore,
    blocked: &'a BlockedCells,
}

impl<'a> WorldTerrainOracle<'a> {
    /// Borrows the loaded terrain and the host's blocked cells.
    #[must_use]
    pub const fn new(store: &'a ChunkStore, blocked: &'a BlockedCells) -> Self {
        Self { store, blocked }
    }

    /// Returns true if the chunk covering world `(x, z)` is loaded.
    #[must_use]
    pub fn is_loaded(&self, x: f32, z: f32) -> bool {
        let coord = ChunkCoord::containing(Vec2::new(x, z), self.store.config().chunk_size);
        self.store.contains(coord)
    }

    /// Returns true if the ground at `(x, z)` lies below a water plane.
    #[must_use]
    pub fn is_underwater(&self, x: f32, z: f32) -> bool {
        let coord = ChunkCoord::containing(Vec2::new(x, z), self.store.config().chunk_size);
        self.store.water(coord).is_some_and(|water| {
            self.store.ground_height(x, z, f32::INFINITY) < water.surface_height()
        })
    }

    /// The host's blocked cells.
    #[must_use]
    pub const fn blocked(&self) -> &BlockedCells {
        self.blocked
    }
}

impl GroundProbe for WorldTerrainOracle<'_> {
    fn ground_height(&self, x: f32, z: f32, max_height: f32) -> f32 {
        self.store.ground_height(x, z, max_height)
    }
}

impl ObstacleProbe for WorldTerrainOracle<'_> {
    /// The radius is ignored; the decision is made at the cell under
    /// `center`.
    fn is_obstructed(&self, center: Vec3, _radius: f32) -> bool {
        if self.blocked.is_blocked(GridPos::from_world(center)) {
            return true;
        }
        !self.is_loaded(center.x, center.z) || self.is_underwater(center.x, center.z)
    }
}
