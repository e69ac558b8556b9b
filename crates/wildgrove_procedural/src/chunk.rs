//! # Chunk Grid
//!
//! The world's ground plane is cut into square chunks of `chunk_size`
//! world units. Chunk `(cx, cz)` has its corner at world
//! `(cx * chunk_size, cz * chunk_size)` and its heightmap tile carries
//! `chunk_size + 1` samples per side, so neighbouring tiles share their
//! edge row or column.

use std::fmt;

use serde::{Deserialize, Serialize};
use wildgrove_shared::Vec2;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not world units).
    pub x: i32,
    /// Z coordinate (in chunks, not world units).
    pub z: i32,
}

impl ChunkCoord {
    /// The chunk at the world origin.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk an observer at ground position `at` is considered to stand in.
    ///
    /// Rounds to the nearest chunk corner with ties to even, so with 16-unit
    /// chunks an observer is "in" chunk `(1, 0)` for world x in [8, 24]
    /// except exactly at x = 8.
    #[inline]
    #[must_use]
    pub fn nearest(at: Vec2, chunk_size: u32) -> Self {
        let size = chunk_size as f32;
        Self::new(
            (at.x / size).round_ties_even() as i32,
            (at.y / size).round_ties_even() as i32,
        )
    }

    /// The chunk whose tile covers ground position `at`.
    #[inline]
    #[must_use]
    pub fn containing(at: Vec2, chunk_size: u32) -> Self {
        let size = chunk_size as f32;
        Self::new((at.x / size).floor() as i32, (at.y / size).floor() as i32)
    }

    /// World X of the chunk's corner.
    #[inline]
    #[must_use]
    pub const fn world_x(self, chunk_size: u32) -> i32 {
        self.x * chunk_size as i32
    }

    /// World Z of the chunk's corner.
    #[inline]
    #[must_use]
    pub const fn world_z(self, chunk_size: u32) -> i32 {
        self.z * chunk_size as i32
    }

    /// Grid Manhattan distance to `other`.
    #[inline]
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// Coordinate shifted by `(dx, dz)` chunks.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Inclusive rectangle of chunk coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRect {
    /// Lowest corner (inclusive).
    pub min: ChunkCoord,
    /// Highest corner (inclusive).
    pub max: ChunkCoord,
}

impl ChunkRect {
    /// The square of side `2 * radius + 1` centred on `center`.
    #[must_use]
    pub const fn centered(center: ChunkCoord, radius: u32) -> Self {
        let r = radius as i32;
        Self {
            min: center.offset(-r, -r),
            max: center.offset(r, r),
        }
    }

    /// Returns true if `coord` lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, coord: ChunkCoord) -> bool {
        coord.x >= self.min.x && coord.x <= self.max.x && coord.z >= self.min.z && coord.z <= self.max.z
    }

    /// Number of coordinates covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        let width = (self.max.x - self.min.x + 1) as usize;
        let depth = (self.max.z - self.min.z + 1) as usize;
        width * depth
    }

    /// A rectangle always covers at least one chunk.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Every coordinate, x-major.
    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> {
        let Self { min, max } = *self;
        (min.x..=max.x).flat_map(move |x| (min.z..=max.z).map(move |z| ChunkCoord::new(x, z)))
    }
}

impl fmt::Display for ChunkRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// A synthesized heightmap for one chunk.
///
/// `side * side` normalized samples in [0, 1], stored row-major with `z`
/// as the row and `x` as the column. Owned by exactly one stage at a time:
/// the synthesis worker, the ready queue, then the chunk store (or dropped
/// if it went stale first).
#[derive(Clone, Debug, PartialEq)]
pub struct HeightmapTile {
    coord: ChunkCoord,
    side: usize,
    samples: Box<[f32]>,
}

impl HeightmapTile {
    /// Wraps `samples` as a tile.
    ///
    /// Returns `None` unless `side >= 2` and `samples.len() == side * side`.
    #[must_use]
    pub fn from_samples(coord: ChunkCoord, side: usize, samples: Vec<f32>) -> Option<Self> {
        if side < 2 || samples.len() != side * side {
            return None;
        }
        Some(Self {
            coord,
            side,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Wraps samples the synthesizer already laid out as `side * side`.
    pub(crate) fn from_parts(coord: ChunkCoord, side: usize, samples: Vec<f32>) -> Self {
        debug_assert_eq!(samples.len(), side * side);
        Self {
            coord,
            side,
            samples: samples.into_boxed_slice(),
        }
    }

    /// The chunk this tile belongs to.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Samples per side (`chunk_size + 1`).
    #[inline]
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Sample at column `col` (x) and row `row` (z).
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= side`.
    #[inline]
    #[must_use]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        assert!(col < self.side && row < self.side, "cell ({col}, {row}) outside tile");
        self.samples[row * self.side + col]
    }

    /// All samples, row-major.
    #[inline]
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Native-endian bytes of the samples, ready for a GPU upload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Lowest sample.
    #[must_use]
    pub fn min_height(&self) -> f32 {
        self.samples.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Highest sample.
    #[must_use]
    pub fn max_height(&self) -> f32 {
        self.samples.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Column, row and value of the highest sample. The first one wins on ties.
    #[must_use]
    pub fn highest_cell(&self) -> (usize, usize, f32) {
        let (index, value) = self
            .samples
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best });
        (index % self.side, index / self.side, value)
    }

    /// Bilinear sample at fractional cell position `(u, v)`.
    ///
    /// `u` runs along columns, `v` along rows; both are clamped to
    /// `[0, side - 1]`.
    #[must_use]
    pub fn interpolate(&self, u: f32, v: f32) -> f32 {
        let last = (self.side - 1) as f32;
        let u = u.clamp(0.0, last);
        let v = v.clamp(0.0, last);

        let col = (u.floor() as usize).min(self.side - 2);
        let row = (v.floor() as usize).min(self.side - 2);
        let fu = u - col as f32;
        let fv = v - row as f32;

        let near = self.get(col, row) * (1.0 - fu) + self.get(col + 1, row) * fu;
        let far = self.get(col, row + 1) * (1.0 - fu) + self.get(col + 1, row + 1) * fu;
        near * (1.0 - fv) + far * fv
    }
}
