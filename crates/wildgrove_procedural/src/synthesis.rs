//! # Terrain Synthesis
//!
//! Turns a chunk coordinate into a heightmap tile by summing four octaves
//! of coherent noise.
//!
//! ## Octave Layout
//!
//! - Each octave samples the noise at its own far-away offset so octaves
//!   do not share features. The offsets come from the seed: eight 4-bit
//!   nibbles, low bits first, alternating x then z, each mapped to [-8, 8)
//!   and scaled by 1024 world units.
//! - Frequency starts at `lacunarity^-(OCTAVES - 1)` and grows by
//!   `lacunarity`; amplitude starts at 1 and shrinks by `persistence`.
//! - Each octave's sample is remapped from [-1, 1] to [0, 1] before
//!   weighting, and the sum is divided by the total weight, so every cell
//!   stays in [0, 1].
//!
//! Synthesis is a pure function of `(coord, config)` and the noise seed.
//! Workers call it concurrently through a shared `Arc`.

use crate::chunk::{ChunkCoord, HeightmapTile};
use crate::config::GenerationConfig;
use crate::error::{SynthesisError, SynthesisResult};
use crate::noise::{NoiseField, NoiseSeed, SimplexNoise};

/// Octaves summed per cell.
pub const OCTAVES: usize = 4;

/// Half-width of the per-axis offset range.
const OFFSET_RANGE: i32 = 8;

/// Bits of seed consumed per offset component.
const OFFSET_BITS: u32 = 4;

/// World units per offset step.
const OFFSET_SCALE: f64 = 1024.0;

/// Per-octave `(x, z)` offsets derived from `seed`, each in [-8, 8).
#[must_use]
pub fn octave_offsets(seed: u32) -> [(i32, i32); OCTAVES] {
    let mut bits = seed;
    let mut offsets = [(0, 0); OCTAVES];
    for offset in &mut offsets {
        let x = (bits & 0xf) as i32 - OFFSET_RANGE;
        bits >>= OFFSET_BITS;
        let z = (bits & 0xf) as i32 - OFFSET_RANGE;
        bits >>= OFFSET_BITS;
        *offset = (x, z);
    }
    offsets
}

/// Produces heightmap tiles from a noise field.
///
/// # Example
///
/// ```rust
/// use wildgrove_procedural::{ChunkCoord, GenerationConfig, TerrainSynthesizer};
///
/// let config = GenerationConfig::default();
/// let synth = TerrainSynthesizer::from_seed(config.seed);
/// let tile = synth.synthesize(ChunkCoord::new(3, -2), &config).unwrap();
///
/// assert_eq!(tile.side(), config.tile_side());
/// assert!(tile.samples().iter().all(|h| (0.0..=1.0).contains(h)));
/// ```
#[derive(Debug)]
pub struct TerrainSynthesizer<N = SimplexNoise> {
    noise: N,
}

impl TerrainSynthesizer<SimplexNoise> {
    /// Simplex noise seeded from the generation seed.
    #[must_use]
    pub fn from_seed(seed: u32) -> Self {
        Self::new(SimplexNoise::new(NoiseSeed::from(seed)))
    }
}

impl<N: NoiseField> TerrainSynthesizer<N> {
    /// Wraps a noise field.
    #[must_use]
    pub const fn new(noise: N) -> Self {
        Self { noise }
    }

    /// The underlying noise field.
    #[must_use]
    pub const fn noise(&self) -> &N {
        &self.noise
    }

    /// Synthesizes the tile for `coord`.
    ///
    /// # Arguments
    ///
    /// * `coord` - Chunk to synthesize
    /// * `config` - Terrain shape; read only
    ///
    /// # Errors
    ///
    /// - `SynthesisError::InvalidConfig` if `config` fails validation
    /// - `SynthesisError::NonFiniteSample` if the noise returns NaN or infinity
    pub fn synthesize(&self, coord: ChunkCoord, config: &GenerationConfig) -> SynthesisResult<HeightmapTile> {
        config.validate()?;

        let side = config.tile_side();
        let start_x = f64::from(coord.world_x(config.chunk_size));
        let start_z = f64::from(coord.world_z(config.chunk_size));
        let lacunarity = f64::from(config.lacunarity);
        let persistence = f64::from(config.persistence);
        let base_scale = f64::from(config.base_scale);
        let first_frequency = lacunarity.powi(1 - OCTAVES as i32);

        let offsets = octave_offsets(config.seed).map(|(x, z)| {
            (OFFSET_SCALE * f64::from(x), OFFSET_SCALE * f64::from(z))
        });

        let mut samples = Vec::with_capacity(side * side);
        for row in 0..side {
            let world_z = start_z + row as f64;
            for col in 0..side {
                let world_x = start_x + col as f64;

                let mut weighted = 0.0;
                let mut weight = 0.0;
                let mut frequency = first_frequency;
                let mut amplitude = 1.0;

                for &(offset_x, offset_z) in &offsets {
                    let n = self.noise.sample(
                        (world_x + offset_x) * frequency / base_scale,
                        (world_z + offset_z) * frequency / base_scale,
                    );
                    if !n.is_finite() {
                        return Err(SynthesisError::NonFiniteSample { coord, col, row });
                    }
                    weighted += ((n + 1.0) * 0.5).clamp(0.0, 1.0) * amplitude;
                    weight += amplitude;
                    frequency *= lacunarity;
                    amplitude *= persistence;
                }

                samples.push((weighted / weight) as f32);
            }
        }

        Ok(HeightmapTile::from_parts(coord, side, samples))
    }
}
