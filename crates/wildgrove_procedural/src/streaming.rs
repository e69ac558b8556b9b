//! # Chunk Streaming
//!
//! Keeps the square of chunks around a moving observer loaded.
//!
//! ## Per-Coordinate States
//!
//! ```text
//! Absent -> Pending -> Queued -> Loaded -> Absent (evicted)
//!                        |
//!                        +-> Absent (stale, discarded)
//! Pending -> Absent (synthesis failed, retried on the next recompute)
//! ```
//!
//! ## Per-Tick Algorithm
//!
//! 1. Track the observer chunk. When the observer has travelled at least
//!    one chunk length since the last recompute, evict everything outside
//!    the new rectangle and dispatch every absent coordinate inside it.
//! 2. Move every finished synthesis outcome into the ready queue, which is
//!    ordered by Manhattan distance to the observer chunk.
//! 3. Commit up to `batch_count` ready tiles, nearest first. Tiles that
//!    left the rectangle (or are somehow already loaded) are dropped and do
//!    not count against the batch. A full pool first gives up the chunks
//!    that lie outside the current rectangle.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use wildgrove_core::PriorityQueue;
use wildgrove_shared::{ConfigResult, Vec3};

use crate::chunk::{ChunkCoord, ChunkRect, HeightmapTile};
use crate::config::{GenerationConfig, StreamingConfig, WorldConfig};
use crate::error::{StreamingError, StreamingResult};
use crate::executor::{InlineExecutor, SynthesisExecutor, SynthesisOutcome, ThreadedExecutor};
use crate::noise::{NoiseField, SimplexNoise};
use crate::render::ChunkRenderer;
use crate::store::ChunkStore;
use crate::synthesis::TerrainSynthesizer;

/// Longest single block inside `wait_for_spawn`.
const SPAWN_POLL: Duration = Duration::from_millis(20);

/// Where a coordinate is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not requested, or evicted, or discarded.
    Absent,
    /// Synthesis dispatched, outcome not yet collected.
    Pending,
    /// Tile synthesized, waiting in the ready queue.
    Queued,
    /// Committed to the chunk store.
    Loaded,
}

/// The chosen first spawn location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPoint {
    /// Chunk whose tile held the peak.
    pub chunk: ChunkCoord,
    /// Column (x) of the peak cell.
    pub col: usize,
    /// Row (z) of the peak cell.
    pub row: usize,
    /// World position, one unit above the ground.
    pub position: Vec3,
}

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The rectangle was recomputed this tick.
    pub recomputed: bool,
    /// Coordinates dispatched for synthesis.
    pub dispatched: Vec<ChunkCoord>,
    /// Coordinates evicted from the store.
    pub evicted: Vec<ChunkCoord>,
    /// Coordinates committed, in commit order.
    pub committed: Vec<ChunkCoord>,
    /// Synthesis outcomes moved into the ready queue.
    pub completed: usize,
    /// Coordinates whose synthesis failed and reverted to absent.
    pub failed: Vec<ChunkCoord>,
    /// Stale tiles dropped without committing.
    pub discarded: usize,
}

/// A synthesized tile waiting to be committed.
#[derive(Debug)]
struct ReadyTile {
    /// Manhattan distance to the observer chunk, refreshed when it changes.
    distance: u32,
    tile: HeightmapTile,
}

impl ReadyTile {
    fn nearest_first(a: &Self, b: &Self) -> Ordering {
        a.distance
            .cmp(&b.distance)
            .then_with(|| a.tile.coord().cmp(&b.tile.coord()))
    }
}

type ReadyQueue = PriorityQueue<ReadyTile, fn(&ReadyTile, &ReadyTile) -> Ordering>;

/// Streams terrain chunks around an observer.
///
/// Owns its chunk store and synthesis executor; the host owns the renderer
/// and passes it into every call that may materialize or release objects.
///
/// # Example
///
/// ```rust
/// use wildgrove_procedural::{ChunkStreamer, NullRenderer, WorldConfig};
/// use wildgrove_shared::Vec3;
///
/// let mut config = WorldConfig::default();
/// config.streaming.render_distance = 1;
/// config.streaming.batch_count = 9;
///
/// let mut streamer = ChunkStreamer::inline(&config).unwrap();
/// let mut renderer = NullRenderer::new();
///
/// streamer.start(Vec3::ZERO);
/// let report = streamer.tick(Vec3::ZERO, &mut renderer);
/// assert_eq!(report.committed.len(), 9);
/// assert_eq!(streamer.store().len(), 9);
/// ```
pub struct ChunkStreamer<E: SynthesisExecutor> {
    config: Arc<GenerationConfig>,
    streaming: StreamingConfig,
    store: ChunkStore,
    executor: E,
    /// Dispatched, outcome not yet collected.
    pending: HashSet<ChunkCoord>,
    /// Synthesized, waiting in `ready`.
    queued: HashSet<ChunkCoord>,
    ready: ReadyQueue,
    observer_chunk: ChunkCoord,
    rect: ChunkRect,
    /// Observer position at the last recompute; `None` before `start`.
    anchor: Option<Vec3>,
    spawn: Option<SpawnPoint>,
}

impl ChunkStreamer<ThreadedExecutor> {
    /// Streamer with `worker_threads` synthesis threads over simplex noise.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in `config`.
    pub fn threaded(config: &WorldConfig) -> ConfigResult<Self> {
        config.validate()?;
        let generation = Arc::new(config.generation.clone());
        let synthesizer = Arc::new(TerrainSynthesizer::from_seed(generation.seed));
        let executor = ThreadedExecutor::new(
            synthesizer,
            Arc::clone(&generation),
            config.streaming.worker_threads as usize,
        );
        Self::new(generation, config.streaming.clone(), executor)
    }
}

impl ChunkStreamer<InlineExecutor<SimplexNoise>> {
    /// Streamer that synthesizes on the calling thread over simplex noise.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in `config`.
    pub fn inline(config: &WorldConfig) -> ConfigResult<Self> {
        Self::inline_with_noise(config, TerrainSynthesizer::from_seed(config.generation.seed))
    }
}

impl<N: NoiseField> ChunkStreamer<InlineExecutor<N>> {
    /// Streamer that synthesizes on the calling thread with a custom noise field.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in `config`.
    pub fn inline_with_noise(config: &WorldConfig, synthesizer: TerrainSynthesizer<N>) -> ConfigResult<Self> {
        config.validate()?;
        let generation = Arc::new(config.generation.clone());
        let executor = InlineExecutor::new(Arc::new(synthesizer), Arc::clone(&generation));
        Self::new(generation, config.streaming.clone(), executor)
    }
}

impl<E: SynthesisExecutor> ChunkStreamer<E> {
    /// Creates a streamer over an existing executor.
    ///
    /// The executor must synthesize with the same `config`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in either config.
    pub fn new(config: Arc<GenerationConfig>, streaming: StreamingConfig, executor: E) -> ConfigResult<Self> {
        config.validate()?;
        streaming.validate()?;
        let rect = ChunkRect::centered(ChunkCoord::ORIGIN, streaming.render_distance);
        Ok(Self {
            store: ChunkStore::new(Arc::clone(&config), streaming.pool_capacity),
            ready: PriorityQueue::with_capacity(
                streaming.rect_area(),
                ReadyTile::nearest_first as fn(&ReadyTile, &ReadyTile) -> Ordering,
            ),
            config,
            streaming,
            executor,
            pending: HashSet::new(),
            queued: HashSet::new(),
            observer_chunk: ChunkCoord::ORIGIN,
            rect,
            anchor: None,
            spawn: None,
        })
    }

    /// Requests the whole rectangle around `observer`.
    ///
    /// Returns the dispatched coordinates.
    pub fn start(&mut self, observer: Vec3) -> Vec<ChunkCoord> {
        self.follow(observer);
        self.anchor = Some(observer);
        let dispatched = self.dispatch_missing();
        tracing::info!(
            "Streaming started at chunk {} with {} chunks requested",
            self.observer_chunk,
            dispatched.len()
        );
        dispatched
    }

    /// Advances streaming by one tick.
    ///
    /// Never blocks on synthesis. Calls `start` implicitly on the first tick.
    pub fn tick<R: ChunkRenderer + ?Sized>(&mut self, observer: Vec3, renderer: &mut R) -> TickReport {
        let mut report = TickReport::default();

        if self.anchor.is_none() {
            report.dispatched = self.start(observer);
        } else {
            self.follow(observer);
            let travelled = self
                .anchor
                .map_or(f32::INFINITY, |anchor| anchor.horizontal_distance(observer));
            if travelled >= self.config.chunk_extent() {
                self.recompute(observer, renderer, &mut report);
            }
        }

        for outcome in self.executor.try_collect() {
            self.accept(outcome, &mut report);
        }

        self.commit_batch(renderer, &mut report);
        report
    }

    /// Forces a rectangle recompute around `observer`, as if it had moved a
    /// full chunk. Also retries any coordinate whose synthesis failed.
    pub fn recenter<R: ChunkRenderer + ?Sized>(&mut self, observer: Vec3, renderer: &mut R) -> TickReport {
        let mut report = TickReport::default();
        self.follow(observer);
        self.recompute(observer, renderer, &mut report);
        report
    }

    /// Blocks until every in-flight synthesis finished or `timeout` passed,
    /// moving the results into the ready queue. Commits nothing.
    ///
    /// Returns true if nothing is left in flight.
    pub fn await_synthesis(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut report = TickReport::default();
        while self.executor.in_flight() > 0 {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            for outcome in self.executor.wait_for_any(deadline - now) {
                self.accept(outcome, &mut report);
            }
        }
        self.executor.in_flight() == 0
    }

    /// Blocks until the first spawn point is chosen and its neighbourhood is
    /// loaded, ticking the streamer meanwhile.
    ///
    /// Once a spawn point is chosen the rectangle is re-centred on it.
    ///
    /// # Errors
    ///
    /// - `StreamingError::SpawnTimeout` if `timeout` passes first
    /// - `StreamingError::NoSpawnCandidate` if the rectangle finished loading,
    ///   failed chunks were retried once, and no tile rose far enough above
    ///   the water
    pub fn wait_for_spawn<R: ChunkRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        timeout: Duration,
    ) -> StreamingResult<SpawnPoint> {
        let started = Instant::now();
        let mut observer = self.anchor.unwrap_or(Vec3::ZERO);
        let mut recentred = false;
        let mut retried = false;

        loop {
            if let Some(spawn) = self.spawn {
                if !recentred {
                    observer = spawn.position;
                    self.recenter(observer, renderer);
                    recentred = true;
                }
                if self.is_spawn_ready() {
                    tracing::info!("Spawn area around chunk {} is loaded", spawn.chunk);
                    return Ok(spawn);
                }
            }

            let report = self.tick(observer, renderer);

            if self.is_idle() {
                if self.spawn.is_none() {
                    // A failed chunk may hold the only candidate.
                    if !retried {
                        retried = true;
                        if !self.recenter(observer, renderer).dispatched.is_empty() {
                            continue;
                        }
                    }
                    return Err(StreamingError::NoSpawnCandidate(self.rect));
                }
                if report.committed.is_empty() {
                    // Something in the neighbourhood failed; request it again.
                    self.recenter(observer, renderer);
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(StreamingError::SpawnTimeout { waited: elapsed });
            }
            if report.committed.is_empty() && self.ready.is_empty() {
                let outcomes = self.executor.wait_for_any(SPAWN_POLL.min(timeout - elapsed));
                let mut scratch = TickReport::default();
                for outcome in outcomes {
                    self.accept(outcome, &mut scratch);
                }
            }
        }
    }

    /// Returns true once a spawn point exists and the configured
    /// neighbourhood around the observer chunk of that point is loaded.
    #[must_use]
    pub fn is_spawn_ready(&self) -> bool {
        self.spawn.is_some_and(|spawn| {
            let center = ChunkCoord::nearest(spawn.position.xz(), self.config.chunk_size);
            self.store.is_area_loaded(center, self.streaming.spawn_neighborhood)
        })
    }

    /// Stops synthesis, drops queued tiles and unloads every chunk.
    pub fn shutdown<R: ChunkRenderer + ?Sized>(&mut self, renderer: &mut R) {
        self.executor.shutdown();
        self.pending.clear();
        self.queued.clear();
        self.ready.clear();
        self.store.clear(renderer);
        tracing::info!("Streaming shut down");
    }

    /// Lifecycle state of `coord`.
    #[must_use]
    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        if self.store.contains(coord) {
            ChunkState::Loaded
        } else if self.queued.contains(&coord) {
            ChunkState::Queued
        } else if self.pending.contains(&coord) {
            ChunkState::Pending
        } else {
            ChunkState::Absent
        }
    }

    /// The chunk store.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// The synthesis executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Generation config.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Streaming policy.
    #[must_use]
    pub const fn streaming_config(&self) -> &StreamingConfig {
        &self.streaming
    }

    /// Chunk the observer was in at the last tick.
    #[must_use]
    pub const fn observer_chunk(&self) -> ChunkCoord {
        self.observer_chunk
    }

    /// Rectangle around the observer chunk.
    #[must_use]
    pub const fn desired_rect(&self) -> ChunkRect {
        self.rect
    }

    /// The first spawn point, once chosen.
    #[must_use]
    pub const fn spawn(&self) -> Option<SpawnPoint> {
        self.spawn
    }

    /// Coordinates with synthesis in flight.
    pub fn pending(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.pending.iter().copied()
    }

    /// Number of coordinates with synthesis in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of synthesized tiles waiting to be committed.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.ready.len()
    }

    /// Nothing pending and nothing queued.
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.ready.is_empty()
    }

    /// Tracks the observer chunk; re-sorts the ready queue when it changes.
    fn follow(&mut self, observer: Vec3) {
        let chunk = ChunkCoord::nearest(observer.xz(), self.config.chunk_size);
        self.rect = ChunkRect::centered(chunk, self.streaming.render_distance);
        if chunk != self.observer_chunk {
            self.observer_chunk = chunk;
            self.ready
                .rebuild_with(|entry| entry.distance = entry.tile.coord().manhattan_distance(chunk));
        }
    }

    /// Evicts outside the current rectangle and requests what is missing inside.
    fn recompute<R: ChunkRenderer + ?Sized>(&mut self, observer: Vec3, renderer: &mut R, report: &mut TickReport) {
        self.anchor = Some(observer);
        report.recomputed = true;
        report.evicted = self.store.evict_outside(&self.rect, renderer);
        report.dispatched = self.dispatch_missing();
        tracing::debug!(
            "Rectangle recomputed around chunk {}: {} evicted, {} dispatched",
            self.observer_chunk,
            report.evicted.len(),
            report.dispatched.len()
        );
    }

    /// Dispatches every absent coordinate in the rectangle.
    fn dispatch_missing(&mut self) -> Vec<ChunkCoord> {
        let mut dispatched = Vec::new();
        for coord in self.rect.iter() {
            if self.chunk_state(coord) != ChunkState::Absent {
                continue;
            }
            match self.executor.dispatch(coord) {
                Ok(()) => {
                    self.pending.insert(coord);
                    dispatched.push(coord);
                }
                Err(e) => tracing::warn!("Could not dispatch chunk {}: {}", coord, e),
            }
        }
        dispatched
    }

    /// Moves one synthesis outcome into the ready queue.
    fn accept(&mut self, outcome: SynthesisOutcome, report: &mut TickReport) {
        let SynthesisOutcome { coord, result } = outcome;
        if !self.pending.remove(&coord) {
            tracing::debug!("Dropping outcome for chunk {} that is no longer pending", coord);
            return;
        }
        match result {
            Ok(tile) => {
                self.queued.insert(coord);
                self.ready.enqueue(ReadyTile {
                    distance: coord.manhattan_distance(self.observer_chunk),
                    tile,
                });
                report.completed += 1;
            }
            Err(e) => {
                tracing::warn!("Synthesis failed for chunk {}: {}", coord, e);
                report.failed.push(coord);
            }
        }
    }

    /// Commits up to `batch_count` ready tiles, nearest first.
    fn commit_batch<R: ChunkRenderer + ?Sized>(&mut self, renderer: &mut R, report: &mut TickReport) {
        let batch = self.streaming.batch_count as usize;
        while report.committed.len() < batch {
            let Ok(ReadyTile { tile, .. }) = self.ready.dequeue() else {
                break;
            };
            let coord = tile.coord();
            self.queued.remove(&coord);

            if !self.rect.contains(coord) || self.store.contains(coord) {
                tracing::debug!("Discarding stale tile for chunk {}", coord);
                report.discarded += 1;
                continue;
            }

            if self.store.len() >= self.store.capacity() {
                // The rectangle follows the observer every tick but only a
                // recompute evicts, so leftovers can still hold slots.
                let evicted = self.store.evict_outside(&self.rect, renderer);
                tracing::debug!("Pool full, evicted {} chunks outside the rectangle", evicted.len());
                report.evicted.extend(evicted);
            }

            if self.spawn.is_none() {
                self.consider_spawn(&tile);
            }

            match self.store.commit(tile, renderer) {
                Ok(_) => report.committed.push(coord),
                Err(e) => tracing::error!("Commit rejected for chunk {}: {}", coord, e),
            }
        }
    }

    /// Picks the tile's peak as the spawn point if it clears the water.
    fn consider_spawn(&mut self, tile: &HeightmapTile) {
        let (col, row, peak) = tile.highest_cell();
        if peak <= self.config.spawn_threshold() {
            return;
        }
        let coord = tile.coord();
        let size = self.config.chunk_size;
        let position = Vec3::new(
            (coord.world_x(size) + col as i32) as f32,
            peak * self.config.height as f32 + 1.0,
            (coord.world_z(size) + row as i32) as f32,
        );
        tracing::info!(
            "Spawn chosen in chunk {} at ({:.1}, {:.1}, {:.1})",
            coord,
            position.x,
            position.y,
            position.z
        );
        self.spawn = Some(SpawnPoint {
            chunk: coord,
            col,
            row,
            position,
        });
    }
}

impl<E: SynthesisExecutor> std::fmt::Debug for ChunkStreamer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStreamer")
            .field("observer_chunk", &self.observer_chunk)
            .field("rect", &self.rect)
            .field("loaded", &self.store.len())
            .field("pending", &self.pending.len())
            .field("queued", &self.ready.len())
            .field("spawn", &self.spawn)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullRenderer;

    /// Flat terrain at a fixed normalized height.
    struct Plateau(f64);

    impl NoiseField for Plateau {
        fn sample(&self, _x: f64, _z: f64) -> f64 {
            self.0
        }
    }

    fn world(render_distance: u32, batch_count: u32) -> WorldConfig {
        WorldConfig {
            generation: GenerationConfig {
                chunk_size: 16,
                ..GenerationConfig::default()
            },
            streaming: StreamingConfig {
                render_distance,
                batch_count,
                ..StreamingConfig::default()
            },
        }
    }

    #[test]
    fn test_first_tick_starts_streaming() {
        let mut streamer = ChunkStreamer::inline(&world(1, 1)).unwrap();
        let mut renderer = NullRenderer::new();
        let report = streamer.tick(Vec3::ZERO, &mut renderer);
        assert_eq!(report.dispatched.len(), 9);
        assert_eq!(report.committed, vec![ChunkCoord::ORIGIN]);
    }

    #[test]
    fn test_states_progress() {
        let mut streamer = ChunkStreamer::inline(&world(1, 1)).unwrap();
        let mut renderer = NullRenderer::new();
        streamer.start(Vec3::ZERO);
        assert_eq!(streamer.chunk_state(ChunkCoord::new(1, 1)), ChunkState::Pending);

        streamer.tick(Vec3::ZERO, &mut renderer);
        assert_eq!(streamer.chunk_state(ChunkCoord::ORIGIN), ChunkState::Loaded);
        assert_eq!(streamer.chunk_state(ChunkCoord::new(1, 1)), ChunkState::Queued);
        assert_eq!(streamer.chunk_state(ChunkCoord::new(5, 5)), ChunkState::Absent);
    }

    #[test]
    fn test_stale_tiles_do_not_use_the_batch() {
        let mut streamer = ChunkStreamer::inline(&world(1, 1)).unwrap();
        let mut renderer = NullRenderer::new();
        streamer.start(Vec3::ZERO);

        // Under one chunk length from the anchor, so no recompute; the
        // observer chunk still moves to (1, 0) and column x = -1 goes stale.
        let observer = Vec3::new(12.0, 0.0, 0.0);
        let first = streamer.tick(observer, &mut renderer);
        assert!(!first.recomputed);
        assert_eq!(streamer.observer_chunk(), ChunkCoord::new(1, 0));
        assert_eq!(first.committed, vec![ChunkCoord::new(1, 0)]);

        for _ in 0..3 {
            let report = streamer.tick(observer, &mut renderer);
            assert_eq!(report.committed.len(), 1);
            assert_eq!(report.discarded, 0);
        }

        // Distance 2: (-1, 0) is stale and dropped, (0, -1) still commits.
        let fifth = streamer.tick(observer, &mut renderer);
        assert_eq!(fifth.discarded, 1);
        assert_eq!(fifth.committed, vec![ChunkCoord::new(0, -1)]);

        let sixth = streamer.tick(observer, &mut renderer);
        assert_eq!(sixth.committed, vec![ChunkCoord::new(0, 1)]);

        let seventh = streamer.tick(observer, &mut renderer);
        assert_eq!(seventh.discarded, 2);
        assert!(seventh.committed.is_empty());
        assert_eq!(streamer.store().len(), 6);
        assert_eq!(streamer.chunk_state(ChunkCoord::new(-1, 0)), ChunkState::Absent);
    }

    #[test]
    fn test_full_pool_gives_up_chunks_outside_the_rectangle() {
        let mut config = world(1, 1);
        config.streaming.pool_capacity = 9;
        let mut streamer = ChunkStreamer::inline(&config).unwrap();
        let mut renderer = NullRenderer::new();

        streamer.tick(Vec3::ZERO, &mut renderer);
        let east = Vec3::new(16.0, 0.0, 0.0);
        for _ in 0..4 {
            streamer.tick(east, &mut renderer);
        }
        assert!(streamer.store().contains(ChunkCoord::new(2, 0)));

        // Back under one chunk length: the rectangle moves, nothing is recomputed.
        let back = Vec3::new(6.0, 0.0, 0.0);
        let mut evicted = Vec::new();
        for _ in 0..12 {
            let report = streamer.tick(back, &mut renderer);
            assert!(!report.recomputed);
            evicted.extend(report.evicted);
        }

        assert_eq!(evicted, vec![ChunkCoord::new(2, 0)]);
        let rect = streamer.desired_rect();
        assert_eq!(rect, ChunkRect::centered(ChunkCoord::ORIGIN, 1));
        for coord in rect.iter() {
            assert_eq!(streamer.chunk_state(coord), ChunkState::Loaded, "{coord} missing");
        }
        assert_eq!(streamer.store().len(), 9);
    }

    #[test]
    fn test_spawn_point_from_plateau_peak() {
        // Plateau at normalized 0.75, well above water level 0.3.
        let config = world(1, 9);
        let mut streamer =
            ChunkStreamer::inline_with_noise(&config, TerrainSynthesizer::new(Plateau(0.5))).unwrap();
        let mut renderer = NullRenderer::new();
        streamer.start(Vec3::ZERO);
        streamer.tick(Vec3::ZERO, &mut renderer);

        let spawn = streamer.spawn().unwrap();
        assert_eq!(spawn.chunk, ChunkCoord::ORIGIN);
        assert_eq!((spawn.col, spawn.row), (0, 0));
        let expected_y = 0.75 * config.generation.height as f32 + 1.0;
        assert!((spawn.position.y - expected_y).abs() < 1e-4);
        assert!(streamer.is_spawn_ready());
    }

    #[test]
    fn test_underwater_world_has_no_spawn() {
        let config = world(1, 9);
        let mut streamer =
            ChunkStreamer::inline_with_noise(&config, TerrainSynthesizer::new(Plateau(-0.9))).unwrap();
        let mut renderer = NullRenderer::new();
        let result = streamer.wait_for_spawn(&mut renderer, Duration::from_secs(5));
        assert!(matches!(result, Err(StreamingError::NoSpawnCandidate(_))));
        assert_eq!(streamer.store().water_count(), 9);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut streamer = ChunkStreamer::inline(&world(1, 9)).unwrap();
        let mut renderer = NullRenderer::new();
        streamer.tick(Vec3::ZERO, &mut renderer);
        assert!(renderer.live() >= 9);
        streamer.shutdown(&mut renderer);
        assert_eq!(renderer.live(), 0);
        assert!(streamer.store().is_empty());
        let report = streamer.tick(Vec3::new(100.0, 0.0, 0.0), &mut renderer);
        assert!(report.dispatched.is_empty());
    }
}
