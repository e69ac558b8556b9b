//! # Coherent Noise
//!
//! Terrain synthesis only needs one thing from noise: a smooth,
//! deterministic 2D field with values in [-1, 1]. `NoiseField` is that
//! contract; `SimplexNoise` is the implementation shipped with the crate.
//!
//! ## Determinism Guarantee
//!
//! A `SimplexNoise` built from a given seed returns bit-identical values on
//! every platform and every run. Only integer math and IEEE-754 `f64`
//! arithmetic without fused operations are involved.

/// A deterministic 2D coherent noise source.
///
/// Implementations must be pure: the same `(x, z)` always yields the same
/// value. `Send + Sync` because synthesis workers share one instance.
pub trait NoiseField: Send + Sync {
    /// Samples the field. Expected range is [-1, 1].
    fn sample(&self, x: f64, z: f64) -> f64;
}

/// Seed for a noise permutation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoiseSeed(u64);

impl NoiseSeed {
    /// Creates a seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// State for the shuffle RNG. Xorshift never leaves zero, so remap it.
    const fn shuffle_state(self) -> u64 {
        // Spread small seeds across the word before shuffling.
        let mixed = self.0.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (self.0 >> 29);
        if mixed == 0 {
            0xDEAD_BEEF_CAFE_BABE
        } else {
            mixed
        }
    }
}

impl From<u32> for NoiseSeed {
    fn from(seed: u32) -> Self {
        Self(u64::from(seed))
    }
}

/// Gradient directions for 2D simplex noise.
const GRADIENTS: [[i8; 2]; 12] = [
    [1, 0], [1, 1], [0, 1], [-1, 1],
    [-1, 0], [-1, -1], [0, -1], [1, -1],
    [1, 0], [0, 1], [-1, 0], [0, -1],
];

/// Seed-shuffled lattice hash.
struct Permutation {
    /// 256 shuffled entries, repeated once so `i + perm[j]` never wraps.
    table: [u8; 512],
}

impl Permutation {
    fn shuffled(seed: NoiseSeed) -> Self {
        let mut table = [0u8; 512];
        for (i, slot) in table.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64.
        let mut state = seed.shuffle_state();
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            table.swap(i, j);
        }

        let (low, high) = table.split_at_mut(256);
        high.copy_from_slice(low);

        Self { table }
    }

    #[inline]
    fn hash(&self, i: usize, j: usize) -> u8 {
        self.table[(i + self.table[j & 255] as usize) & 511]
    }
}

/// 2D simplex noise.
///
/// Values lie in [-1, 1]. Sampling is O(1) and allocation free.
///
/// # Example
///
/// ```rust
/// use wildgrove_procedural::{NoiseField, NoiseSeed, SimplexNoise};
///
/// let noise = SimplexNoise::new(NoiseSeed::new(42));
/// let value = noise.sample(100.5, 200.3);
/// assert!((-1.0..=1.0).contains(&value));
/// assert_eq!(value, SimplexNoise::new(NoiseSeed::new(42)).sample(100.5, 200.3));
/// ```
pub struct SimplexNoise {
    perm: Permutation,
}

impl SimplexNoise {
    /// Skew factor, (sqrt(3) - 1) / 2.
    const F2: f64 = 0.366_025_403_784_438_6;
    /// Unskew factor, (3 - sqrt(3)) / 6.
    const G2: f64 = 0.211_324_865_405_187_1;

    /// Builds the permutation table for `seed`.
    #[must_use]
    pub fn new(seed: NoiseSeed) -> Self {
        Self {
            perm: Permutation::shuffled(seed),
        }
    }

    /// Contribution of one simplex corner.
    #[inline]
    fn corner(dx: f64, dz: f64, hash: u8) -> f64 {
        let falloff = 0.5 - dx * dx - dz * dz;
        if falloff <= 0.0 {
            return 0.0;
        }
        let [gx, gz] = GRADIENTS[(hash % 12) as usize];
        let f2 = falloff * falloff;
        f2 * f2 * (dx * f64::from(gx) + dz * f64::from(gz))
    }
}

impl NoiseField for SimplexNoise {
    fn sample(&self, x: f64, z: f64) -> f64 {
        let skew = (x + z) * Self::F2;
        let i = floor_to_i64(x + skew);
        let j = floor_to_i64(z + skew);

        let unskew = (i + j) as f64 * Self::G2;
        let x0 = x - (i as f64 - unskew);
        let z0 = z - (j as f64 - unskew);

        // Lower or upper triangle of the skewed cell.
        let (i1, j1) = if x0 > z0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let z1 = z0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let z2 = z0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let n0 = Self::corner(x0, z0, self.perm.hash(ii, jj));
        let n1 = Self::corner(x1, z1, self.perm.hash(ii + i1, jj + j1));
        let n2 = Self::corner(x2, z2, self.perm.hash(ii + 1, jj + 1));

        // 70 maps the summed corner contributions onto [-1, 1].
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for SimplexNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplexNoise").finish_non_exhaustive()
    }
}

#[inline]
fn floor_to_i64(value: f64) -> i64 {
    let truncated = value as i64;
    if value < truncated as f64 {
        truncated - 1
    } else {
        truncated
    }
}
