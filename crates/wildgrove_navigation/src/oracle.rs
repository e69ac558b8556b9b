//! # Cost Oracles
//!
//! The search needs ground height and obstacle volume queries. Hosts with
//! one physics world implement both traits on one type; `SplitOracle`
//! pairs two separate sources, and `BlockedCells` is a plain cell set for
//! scripted obstacles.

use std::collections::HashSet;

use wildgrove_shared::{GroundProbe, ObstacleProbe, Vec3};

use crate::grid::GridPos;

/// Everything the search asks the world.
pub trait TerrainOracle: GroundProbe + ObstacleProbe {}

impl<T: GroundProbe + ObstacleProbe + ?Sized> TerrainOracle for T {}

/// Ground from one source, obstacles from another.
#[derive(Debug, Clone, Default)]
pub struct SplitOracle<G, O> {
    /// Ground height source.
    pub ground: G,
    /// Obstacle source.
    pub obstacles: O,
}

impl<G, O> SplitOracle<G, O> {
    /// Pairs two sources.
    #[must_use]
    pub const fn new(ground: G, obstacles: O) -> Self {
        Self { ground, obstacles }
    }
}

impl<G: GroundProbe, O> GroundProbe for SplitOracle<G, O> {
    fn ground_height(&self, x: f32, z: f32, max_height: f32) -> f32 {
        self.ground.ground_height(x, z, max_height)
    }
}

impl<G, O: ObstacleProbe> ObstacleProbe for SplitOracle<G, O> {
    fn is_obstructed(&self, center: Vec3, radius: f32) -> bool {
        self.obstacles.is_obstructed(center, radius)
    }
}

/// A set of impassable cells.
///
/// A probe is obstructed when the cell under its centre is blocked; the
/// radius is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedCells {
    cells: HashSet<GridPos>,
}

impl BlockedCells {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks `cell`. Returns false if it already was.
    pub fn block(&mut self, cell: GridPos) -> bool {
        self.cells.insert(cell)
    }

    /// Unblocks `cell`. Returns false if it was not blocked.
    pub fn unblock(&mut self, cell: GridPos) -> bool {
        self.cells.remove(&cell)
    }

    /// Returns true if `cell` is blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: GridPos) -> bool {
        self.cells.contains(&cell)
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if nothing is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Blocked cells, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.cells.iter().copied()
    }
}

impl FromIterator<GridPos> for BlockedCells {
    fn from_iter<I: IntoIterator<Item = GridPos>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl ObstacleProbe for BlockedCells {
    fn is_obstructed(&self, center: Vec3, _radius: f32) -> bool {
        self.is_blocked(GridPos::from_world(center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wildgrove_shared::FlatGround;

    fn probe<T: TerrainOracle>(oracle: &T, x: f32, z: f32) -> (f32, bool) {
        let ground = oracle.ground_height(x, z, 100.0);
        (ground, oracle.is_obstructed(Vec3::new(x, ground + 1.5, z), 1.5))
    }

    #[test]
    fn test_split_oracle_routes_queries() {
        let blocked: BlockedCells = [GridPos::new(2, 3)].into_iter().collect();
        let oracle = SplitOracle::new(FlatGround { height: 4.0 }, blocked);
        assert_eq!(probe(&oracle, 2.0, 3.0), (4.0, true));
        assert_eq!(probe(&oracle, 2.0, 4.0), (4.0, false));
    }

    #[test]
    fn test_block_and_unblock() {
        let mut cells = BlockedCells::new();
        assert!(cells.block(GridPos::new(1, 1)));
        assert!(!cells.block(GridPos::new(1, 1)));
        assert_eq!(cells.len(), 1);
        assert!(cells.unblock(GridPos::new(1, 1)));
        assert!(cells.is_empty());
    }
}
