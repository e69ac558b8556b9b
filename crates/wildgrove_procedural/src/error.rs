//! # Streaming Error Types
//!
//! Errors raised while synthesizing, storing and streaming chunks.

use std::time::Duration;

use thiserror::Error;
use wildgrove_shared::ConfigError;

use crate::chunk::{ChunkCoord, ChunkRect};

/// A synthesis task failed. The coordinate reverts to absent and is
/// retried on the next rectangle recompute.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// The generation config was rejected before sampling.
    #[error("invalid generation config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The noise source produced NaN or infinity.
    #[error("noise produced a non-finite sample in chunk {coord} at cell ({col}, {row})")]
    NonFiniteSample {
        /// Chunk being synthesized.
        coord: ChunkCoord,
        /// Cell column (x).
        col: usize,
        /// Cell row (z).
        row: usize,
    },

    /// The worker panicked while synthesizing.
    #[error("synthesis worker panicked on chunk {coord}: {message}")]
    WorkerPanicked {
        /// Chunk being synthesized.
        coord: ChunkCoord,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The executor no longer accepts work.
    #[error("executor is shut down, chunk {0} was not dispatched")]
    ExecutorShutDown(ChunkCoord),
}

/// Result alias for synthesis.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Chunk store rejected a commit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The coordinate is already loaded.
    #[error("chunk {0} is already loaded")]
    DuplicateChunk(ChunkCoord),

    /// Every pool slot is taken.
    #[error("chunk pool is full ({capacity} slots), cannot load {coord}")]
    PoolExhausted {
        /// Chunk that could not be stored.
        coord: ChunkCoord,
        /// Pool capacity.
        capacity: usize,
    },
}

/// Result alias for chunk store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Streaming failed as a whole.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamingError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The spawn area did not finish loading in time.
    #[error("spawn area not loaded after {waited:?}")]
    SpawnTimeout {
        /// How long the caller waited.
        waited: Duration,
    },

    /// Every chunk in the rectangle is loaded and none rises above the water.
    #[error("no chunk in {0} rises high enough above the water to spawn on")]
    NoSpawnCandidate(ChunkRect),
}

/// Result alias for streaming operations.
pub type StreamingResult<T> = Result<T, StreamingError>;
