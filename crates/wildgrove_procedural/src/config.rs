//! # Generation & Streaming Configuration
//!
//! Loaded once at startup, validated, then shared read-only. Workers get
//! the generation config as `Arc<GenerationConfig>`.

use serde::{Deserialize, Serialize};
use wildgrove_shared::{ensure_positive, ConfigError, ConfigResult};

/// Terrain shape parameters.
///
/// Immutable after construction; every synthesis call reads the same
/// snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed; its nibbles pick the per-octave noise offsets.
    pub seed: u32,
    /// Frequency multiplier between octaves. Must be > 1.
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves. Must be in (0, 1).
    pub persistence: f32,
    /// Chunk edge length in world units. A tile has `chunk_size + 1` samples per side.
    pub chunk_size: u32,
    /// Horizontal scale divisor applied to noise input.
    pub base_scale: u32,
    /// World height of a normalized sample of 1.0.
    pub height: u32,
    /// Normalized water surface height, in [0, 1].
    pub water_level: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_1234,
            lacunarity: 2.0,
            persistence: 0.5,
            chunk_size: 16,
            base_scale: 64,
            height: 32,
            water_level: 0.3,
        }
    }
}

impl GenerationConfig {
    /// Checks every field against its permitted range.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a `ConfigError`.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.lacunarity > 1.0 && self.lacunarity.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "lacunarity",
                value: self.lacunarity,
                range: "(1, inf)",
            });
        }
        if !(self.persistence > 0.0 && self.persistence < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "persistence",
                value: self.persistence,
                range: "(0, 1)",
            });
        }
        if !(0.0..=1.0).contains(&self.water_level) {
            return Err(ConfigError::OutOfRange {
                field: "water_level",
                value: self.water_level,
                range: "[0, 1]",
            });
        }
        ensure_positive("chunk_size", u64::from(self.chunk_size))?;
        ensure_positive("base_scale", u64::from(self.base_scale))?;
        ensure_positive("height", u64::from(self.height))?;
        Ok(())
    }

    /// Samples per tile side.
    #[inline]
    #[must_use]
    pub const fn tile_side(&self) -> usize {
        self.chunk_size as usize + 1
    }

    /// Chunk edge length as a world distance.
    #[inline]
    #[must_use]
    pub fn chunk_extent(&self) -> f32 {
        self.chunk_size as f32
    }

    /// World height of the water surface.
    #[inline]
    #[must_use]
    pub fn water_surface(&self) -> f32 {
        self.water_level * self.height as f32
    }

    /// Normalized height a tile's peak must exceed to host the first spawn.
    ///
    /// One world unit above the water surface.
    #[inline]
    #[must_use]
    pub fn spawn_threshold(&self) -> f32 {
        self.water_level + 1.0 / self.height as f32
    }
}

/// Streaming policy around the observer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks kept on each side of the observer chunk.
    pub render_distance: u32,
    /// Maximum commits per tick.
    pub batch_count: u32,
    /// Synthesis worker threads for the threaded executor.
    pub worker_threads: u32,
    /// Side of the square neighbourhood that must be loaded before spawning.
    pub spawn_neighborhood: u32,
    /// Slots in the loaded-chunk and water pools.
    pub pool_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            render_distance: 4,
            batch_count: 1,
            worker_threads: 2,
            spawn_neighborhood: 3,
            pool_capacity: 512,
        }
    }
}

impl StreamingConfig {
    /// Chunks along one side of the render rectangle.
    #[inline]
    #[must_use]
    pub const fn rect_side(&self) -> u32 {
        self.render_distance * 2 + 1
    }

    /// Chunks in one render rectangle.
    #[inline]
    #[must_use]
    pub const fn rect_area(&self) -> usize {
        let side = self.rect_side() as usize;
        side * side
    }

    /// Checks counts and that one rectangle fits in the pool.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a `ConfigError`.
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_positive("batch_count", u64::from(self.batch_count))?;
        ensure_positive("worker_threads", u64::from(self.worker_threads))?;
        if self.spawn_neighborhood % 2 == 0 || self.spawn_neighborhood > self.rect_side() {
            return Err(ConfigError::SpawnNeighborhood {
                neighborhood: self.spawn_neighborhood,
                side: self.rect_side(),
            });
        }
        if self.pool_capacity < self.rect_area() {
            return Err(ConfigError::PoolTooSmall {
                capacity: self.pool_capacity,
                required: self.rect_area(),
            });
        }
        Ok(())
    }
}

/// Everything a host needs to stand up terrain streaming.
///
/// # Example
///
/// ```rust
/// use wildgrove_procedural::WorldConfig;
///
/// let config = WorldConfig::from_toml_str(r#"
///     [generation]
///     seed = 7
///     chunk_size = 32
///
///     [streaming]
///     render_distance = 2
/// "#).unwrap();
///
/// assert_eq!(config.generation.chunk_size, 32);
/// assert_eq!(config.streaming.batch_count, 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Terrain shape.
    pub generation: GenerationConfig,
    /// Streaming policy.
    pub streaming: StreamingConfig,
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing tables and fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML, otherwise the first
    /// validation failure.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> ConfigResult<()> {
        self.generation.validate()?;
        self.streaming.validate()
    }
}
