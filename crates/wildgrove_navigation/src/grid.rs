//! # Search Grid
//!
//! An implicit, unbounded, 8-connected grid of integer cells in the world
//! XZ plane. One cell per world unit.

use std::fmt;

use serde::{Deserialize, Serialize};
use wildgrove_shared::Vec3;

/// Integer grid cell.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    /// World X, rounded.
    pub x: i32,
    /// World Z, rounded.
    pub z: i32,
}

impl GridPos {
    /// The eight neighbour offsets: orthogonal first, then diagonal.
    pub const DIRECTIONS: [(i32, i32); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, 1),
        (1, 1),
        (1, -1),
        (-1, -1),
    ];

    /// Creates a cell.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Cell nearest to a world position. Height is ignored.
    #[inline]
    #[must_use]
    pub fn from_world(position: Vec3) -> Self {
        Self::new(position.x.round() as i32, position.z.round() as i32)
    }

    /// World position of the cell centre at height `y`.
    #[inline]
    #[must_use]
    pub fn to_world(self, y: f32) -> Vec3 {
        Vec3::new(self.x as f32, y, self.z as f32)
    }

    /// Cell shifted by `(dx, dz)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The eight neighbours in `DIRECTIONS` order.
    pub fn neighbours(self) -> impl Iterator<Item = Self> {
        Self::DIRECTIONS.into_iter().map(move |(dx, dz)| self.offset(dx, dz))
    }

    /// Squared Euclidean distance in cells.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dz * dz
    }

    /// Euclidean distance in cells.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.distance_squared(other) as f64).sqrt() as f32
    }

    /// Returns true for the eight surrounding cells.
    #[inline]
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        let dx = (self.x - other.x).abs();
        let dz = (self.z - other.z).abs();
        dx <= 1 && dz <= 1 && dx + dz > 0
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
