//! # Configuration Errors
//!
//! Every config type in the workspace validates into this one error type,
//! so a host loading a single TOML file sees a single error surface.

use thiserror::Error;

/// A configuration value is out of range or could not be parsed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count or size that must be positive is zero.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A float field is outside its permitted range.
    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
        /// Human-readable permitted range.
        range: &'static str,
    },

    /// The chunk pool cannot hold one full render rectangle.
    #[error("pool capacity {capacity} cannot hold the {required} chunks of one render rectangle")]
    PoolTooSmall {
        /// Configured pool capacity.
        capacity: usize,
        /// Chunks in one render rectangle.
        required: usize,
    },

    /// The spawn neighbourhood must be odd and fit inside the render rectangle.
    #[error("spawn neighbourhood {neighborhood} must be odd and at most the rectangle side {side}")]
    SpawnNeighborhood {
        /// Configured neighbourhood side.
        neighborhood: u32,
        /// Render rectangle side.
        side: u32,
    },

    /// The configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Result alias for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rejects a zero count.
///
/// # Errors
///
/// Returns `ConfigError::NotPositive` naming `field` when `value` is zero.
pub fn ensure_positive(field: &'static str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::NotPositive { field });
    }
    Ok(())
}
