//! # Wildgrove Procedural
//!
//! Deterministic terrain synthesis and chunk streaming around a moving
//! observer.
//!
//! ## Core Components
//!
//! - `SimplexNoise`: seeded coherent noise behind the `NoiseField` trait
//! - `TerrainSynthesizer`: four-octave heightmap tile per chunk coordinate
//! - `ChunkStore`: pooled loaded chunks and their water planes
//! - `ThreadedExecutor` / `InlineExecutor`: where synthesis runs
//! - `ChunkStreamer`: the per-tick load, commit and evict state machine
//!
//! ## Threading
//!
//! Synthesis is the only work that leaves the tick thread. Every store
//! mutation and every renderer call happens inside `ChunkStreamer::tick`
//! (or `recenter`, `wait_for_spawn`, `shutdown`) on the caller's thread.
//!
//! ## Example
//!
//! ```rust
//! use wildgrove_procedural::{ChunkCoord, GenerationConfig, TerrainSynthesizer};
//!
//! let config = GenerationConfig::default();
//! let synthesizer = TerrainSynthesizer::from_seed(config.seed);
//! let tile = synthesizer.synthesize(ChunkCoord::new(3, -2), &config).unwrap();
//! assert_eq!(tile.side(), config.tile_side());
//! assert!(tile.samples().iter().all(|h| (0.0..=1.0).contains(h)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod executor;
pub mod noise;
pub mod render;
pub mod store;
pub mod streaming;
pub mod synthesis;

pub use chunk::{ChunkCoord, ChunkRect, HeightmapTile};
pub use config::{GenerationConfig, StreamingConfig, WorldConfig};
pub use error::{
    StoreError, StoreResult, StreamingError, StreamingResult, SynthesisError, SynthesisResult,
};
pub use executor::{
    ExecutorStats, InlineExecutor, SynthesisExecutor, SynthesisOutcome, ThreadedExecutor,
};
pub use noise::{NoiseField, NoiseSeed, SimplexNoise};
pub use render::{ChunkRenderer, NullRenderer, RenderHandle};
pub use store::{ChunkStore, LoadedChunk, LoadedWater};
pub use streaming::{ChunkState, ChunkStreamer, SpawnPoint, TickReport};
pub use synthesis::{octave_offsets, TerrainSynthesizer, OCTAVES};
pub use wildgrove_shared::{ConfigError, ConfigResult};
