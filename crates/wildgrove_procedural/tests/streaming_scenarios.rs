//! End-to-end streaming scenarios against the public `ChunkStreamer` API.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use wildgrove_procedural::{
    ChunkCoord, ChunkState, ChunkStreamer, GenerationConfig, NoiseField, NullRenderer, StreamingConfig,
    TerrainSynthesizer, WorldConfig,
};
use wildgrove_shared::Vec3;

fn world(render_distance: u32, batch_count: u32) -> WorldConfig {
    WorldConfig {
        generation: GenerationConfig::default(),
        streaming: StreamingConfig {
            render_distance,
            batch_count,
            ..StreamingConfig::default()
        },
    }
}

/// Constant field; every tile is flat at `(value + 1) / 2`.
struct Plateau(f64);

impl NoiseField for Plateau {
    fn sample(&self, _x: f64, _z: f64) -> f64 {
        self.0
    }
}

/// Returns NaN for the first sample taken at the exact origin.
struct FlakyOrigin {
    tripped: AtomicBool,
}

impl NoiseField for FlakyOrigin {
    fn sample(&self, x: f64, z: f64) -> f64 {
        if x == 0.0 && z == 0.0 && !self.tripped.swap(true, Ordering::SeqCst) {
            return f64::NAN;
        }
        0.2
    }
}

/// Sea everywhere except a peak at world (-8, -8), inside chunk (-1, -1).
/// The first sample of the peak is NaN. Assumes zero octave offsets.
struct FlakyIsland {
    tripped: AtomicBool,
}

impl FlakyIsland {
    /// World (-8, -8) at the first octave's frequency of 1/8 over scale 64.
    const PEAK: f64 = -1.0 / 64.0;
}

impl NoiseField for FlakyIsland {
    fn sample(&self, x: f64, z: f64) -> f64 {
        if x != Self::PEAK || z != Self::PEAK {
            return -0.8;
        }
        if self.tripped.swap(true, Ordering::SeqCst) {
            1.0
        } else {
            f64::NAN
        }
    }
}

#[test]
fn test_nine_chunks_commit_one_per_tick_nearest_first() {
    let config = world(1, 1);
    let mut streamer = ChunkStreamer::threaded(&config).unwrap();
    let mut renderer = NullRenderer::new();

    let dispatched = streamer.start(Vec3::ZERO);
    assert_eq!(dispatched.len(), 9);
    assert!(streamer.await_synthesis(Duration::from_secs(30)));
    assert_eq!(streamer.queued_count(), 9);

    let mut order = Vec::new();
    for tick in 0..9 {
        let report = streamer.tick(Vec3::ZERO, &mut renderer);
        assert_eq!(report.committed.len(), 1, "tick {tick}");
        order.extend(report.committed);
    }

    assert_eq!(streamer.store().len(), 9);
    let distances: Vec<u32> = order
        .iter()
        .map(|coord| coord.manhattan_distance(ChunkCoord::ORIGIN))
        .collect();
    assert_eq!(distances, vec![0, 1, 1, 1, 1, 2, 2, 2, 2]);

    let idle = streamer.tick(Vec3::ZERO, &mut renderer);
    assert!(idle.committed.is_empty());
    streamer.shutdown(&mut renderer);
}

#[test]
fn test_moving_one_chunk_shifts_exactly_one_column() {
    let mut streamer = ChunkStreamer::inline(&world(1, 9)).unwrap();
    let mut renderer = NullRenderer::new();
    streamer.tick(Vec3::ZERO, &mut renderer);
    assert_eq!(streamer.store().len(), 9);

    let report = streamer.tick(Vec3::new(16.0, 0.0, 0.0), &mut renderer);
    assert!(report.recomputed);
    assert_eq!(
        report.evicted,
        vec![ChunkCoord::new(-1, -1), ChunkCoord::new(-1, 0), ChunkCoord::new(-1, 1)]
    );
    assert_eq!(
        report.dispatched,
        vec![ChunkCoord::new(2, -1), ChunkCoord::new(2, 0), ChunkCoord::new(2, 1)]
    );
    assert_eq!(report.committed.len(), 3);
    assert_eq!(streamer.store().len(), 9);
    assert!(streamer.desired_rect().iter().all(|coord| streamer.store().contains(coord)));
}

#[test]
fn test_short_moves_do_not_recompute() {
    let mut streamer = ChunkStreamer::inline(&world(1, 9)).unwrap();
    let mut renderer = NullRenderer::new();
    streamer.tick(Vec3::ZERO, &mut renderer);

    let report = streamer.tick(Vec3::new(15.9, 0.0, 0.0), &mut renderer);
    assert!(!report.recomputed);
    assert!(report.evicted.is_empty());
    assert!(report.dispatched.is_empty());
    assert_eq!(streamer.chunk_state(ChunkCoord::new(2, 0)), ChunkState::Absent);
}

#[test]
fn test_long_jump_evicts_everything_and_releases_handles() {
    let mut streamer = ChunkStreamer::inline(&world(1, 9)).unwrap();
    let mut renderer = NullRenderer::new();
    streamer.tick(Vec3::ZERO, &mut renderer);
    let live_before = renderer.live();

    let report = streamer.tick(Vec3::new(1000.0, 0.0, -1000.0), &mut renderer);
    assert_eq!(report.evicted.len(), 9);
    assert_eq!(report.dispatched.len(), 9);
    assert_eq!(renderer.released() as usize, live_before);
    assert_eq!(streamer.observer_chunk(), ChunkCoord::new(63, -63));
    assert!(streamer
        .store()
        .coords()
        .all(|coord| coord.manhattan_distance(ChunkCoord::new(63, -63)) <= 2));
}

#[test]
fn test_water_follows_the_lowest_cell() {
    let mut renderer = NullRenderer::new();

    let high = WorldConfig::default();
    let mut dry = ChunkStreamer::inline_with_noise(&high, TerrainSynthesizer::new(Plateau(0.5))).unwrap();
    dry.tick(Vec3::ZERO, &mut renderer);
    assert!(!dry.store().is_empty());
    assert_eq!(dry.store().water_count(), 0);

    let mut wet = ChunkStreamer::inline_with_noise(&high, TerrainSynthesizer::new(Plateau(-0.8))).unwrap();
    wet.tick(Vec3::ZERO, &mut renderer);
    let loaded = wet.store().try_get(ChunkCoord::ORIGIN).unwrap();
    let water = wet.store().water(ChunkCoord::ORIGIN).unwrap();
    let generation = &high.generation;
    let half = generation.chunk_size as f32 / 2.0;
    assert!(loaded.min_height() < generation.water_level);
    assert_eq!(water.center(), Vec3::new(half, generation.water_surface(), half));
}

#[test]
fn test_water_invariant_holds_on_real_terrain() {
    let mut config = world(3, 64);
    config.generation.water_level = 0.45;
    let mut streamer = ChunkStreamer::inline(&config).unwrap();
    let mut renderer = NullRenderer::new();
    streamer.tick(Vec3::ZERO, &mut renderer);
    assert_eq!(streamer.store().len(), 49);

    for chunk in streamer.store().chunks() {
        let has_water = streamer.store().water(chunk.coord()).is_some();
        assert_eq!(has_water, chunk.min_height() < config.generation.water_level, "{}", chunk.coord());
    }
}

#[test]
fn test_no_coordinate_is_ever_duplicated() {
    let config = world(2, 2);
    let mut streamer = ChunkStreamer::threaded(&config).unwrap();
    let mut renderer = NullRenderer::new();
    let mut loaded: HashSet<ChunkCoord> = HashSet::new();

    for step in 0..400u16 {
        let observer = Vec3::new(f32::from(step) * 0.7, 0.0, f32::from(step) * 0.3);
        let pending_before: HashSet<ChunkCoord> = streamer.pending().collect();
        let report = streamer.tick(observer, &mut renderer);

        for coord in &report.evicted {
            assert!(loaded.remove(coord));
        }
        for coord in &report.dispatched {
            assert!(!loaded.contains(coord), "dispatched loaded chunk {coord}");
            assert!(!pending_before.contains(coord), "dispatched pending chunk {coord}");
        }
        for coord in &report.committed {
            assert!(loaded.insert(*coord), "committed {coord} twice");
        }
        assert_eq!(loaded.len(), streamer.store().len());
        std::thread::sleep(Duration::from_millis(1));
    }
    streamer.shutdown(&mut renderer);
    assert_eq!(renderer.live(), 0);
}

#[test]
fn test_failed_synthesis_reverts_and_retries() {
    let mut config = world(1, 9);
    // Every nibble is 8, so each octave offset is zero and chunk (-1, -1)
    // samples the exact origin at its far corner.
    config.generation.seed = 0x8888_8888;
    let noise = FlakyOrigin {
        tripped: AtomicBool::new(false),
    };
    let mut streamer = ChunkStreamer::inline_with_noise(&config, TerrainSynthesizer::new(noise)).unwrap();
    let mut renderer = NullRenderer::new();

    let first = streamer.tick(Vec3::ZERO, &mut renderer);
    assert_eq!(first.failed, vec![ChunkCoord::new(-1, -1)]);
    assert_eq!(first.committed.len(), 8);
    assert_eq!(streamer.chunk_state(ChunkCoord::new(-1, -1)), ChunkState::Absent);

    let retry = streamer.recenter(Vec3::ZERO, &mut renderer);
    assert_eq!(retry.dispatched, vec![ChunkCoord::new(-1, -1)]);
    let after = streamer.tick(Vec3::ZERO, &mut renderer);
    assert_eq!(after.committed, vec![ChunkCoord::new(-1, -1)]);
    assert_eq!(streamer.store().len(), 9);
}

#[test]
fn test_spawn_wait_retries_failed_chunks_before_giving_up() {
    let mut config = world(1, 9);
    config.generation.seed = 0x8888_8888;
    let noise = FlakyIsland {
        tripped: AtomicBool::new(false),
    };
    let mut streamer = ChunkStreamer::inline_with_noise(&config, TerrainSynthesizer::new(noise)).unwrap();
    let mut renderer = NullRenderer::new();

    let spawn = streamer
        .wait_for_spawn(&mut renderer, Duration::from_secs(10))
        .unwrap();
    assert_eq!(spawn.chunk, ChunkCoord::new(-1, -1));
    assert_eq!((spawn.col, spawn.row), (8, 8));
    assert_eq!((spawn.position.x, spawn.position.z), (-8.0, -8.0));
    assert!(streamer.is_spawn_ready());
    assert_eq!(streamer.chunk_state(ChunkCoord::new(-1, -1)), ChunkState::Loaded);
    streamer.shutdown(&mut renderer);
}

#[test]
fn test_threaded_spawn_wait_loads_the_neighborhood() {
    let mut config = world(2, 4);
    config.streaming.spawn_neighborhood = 3;
    let mut streamer = ChunkStreamer::threaded(&config).unwrap();
    let mut renderer = NullRenderer::new();

    let spawn = streamer
        .wait_for_spawn(&mut renderer, Duration::from_secs(60))
        .unwrap();
    assert!(streamer.is_spawn_ready());
    assert!(spawn.position.y > config.generation.water_surface());

    let center = ChunkCoord::nearest(spawn.position.xz(), config.generation.chunk_size);
    for dx in -1..=1 {
        for dz in -1..=1 {
            assert!(streamer.store().contains(center.offset(dx, dz)));
        }
    }
    streamer.shutdown(&mut renderer);
}
