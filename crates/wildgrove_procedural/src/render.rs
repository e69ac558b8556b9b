//! # Renderer Binding
//!
//! The host turns committed tiles into meshes and water planes. The store
//! only keeps the opaque handle it gets back and hands it to `release` on
//! eviction.

use crate::chunk::{ChunkCoord, HeightmapTile};
use crate::config::GenerationConfig;

/// Opaque handle to a renderable object owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderHandle(u64);

impl RenderHandle {
    /// Wraps a host-side identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The host-side identifier.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host hook for materializing and releasing terrain objects.
///
/// Called only from the tick thread.
pub trait ChunkRenderer {
    /// Builds the terrain object for a committed tile.
    fn materialize_chunk(
        &mut self,
        coord: ChunkCoord,
        tile: &HeightmapTile,
        config: &GenerationConfig,
    ) -> RenderHandle;

    /// Builds the water plane for a tile that dips below the water level.
    fn materialize_water(
        &mut self,
        coord: ChunkCoord,
        tile: &HeightmapTile,
        config: &GenerationConfig,
    ) -> RenderHandle;

    /// Returns an object to the host's pool.
    fn release(&mut self, handle: RenderHandle);
}

impl<R: ChunkRenderer + ?Sized> ChunkRenderer for &mut R {
    fn materialize_chunk(
        &mut self,
        coord: ChunkCoord,
        tile: &HeightmapTile,
        config: &GenerationConfig,
    ) -> RenderHandle {
        (**self).materialize_chunk(coord, tile, config)
    }

    fn materialize_water(
        &mut self,
        coord: ChunkCoord,
        tile: &HeightmapTile,
        config: &GenerationConfig,
    ) -> RenderHandle {
        (**self).materialize_water(coord, tile, config)
    }

    fn release(&mut self, handle: RenderHandle) {
        (**self).release(handle);
    }
}

/// Renderer for headless hosts. Hands out sequential handles and counts
/// what is live.
#[derive(Debug, Default)]
pub struct NullRenderer {
    next: u64,
    live: usize,
    released: u64,
}

impl NullRenderer {
    /// Creates a renderer with nothing live.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles issued and not yet released.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Handles released so far.
    #[must_use]
    pub const fn released(&self) -> u64 {
        self.released
    }

    fn issue(&mut self) -> RenderHandle {
        self.next += 1;
        self.live += 1;
        RenderHandle(self.next)
    }
}

impl ChunkRenderer for NullRenderer {
    fn materialize_chunk(&mut self, _: ChunkCoord, _: &HeightmapTile, _: &GenerationConfig) -> RenderHandle {
        self.issue()
    }

    fn materialize_water(&mut self, _: ChunkCoord, _: &HeightmapTile, _: &GenerationConfig) -> RenderHandle {
        self.issue()
    }

    fn release(&mut self, _handle: RenderHandle) {
        self.live = self.live.saturating_sub(1);
        self.released += 1;
    }
}
