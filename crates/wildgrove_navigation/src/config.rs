//! # Navigation Configuration
//!
//! `SearchConfig` bounds one D*-Lite instance; `AgentConfig` drives when an
//! agent re-plans. Both deserialize from the host's TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wildgrove_shared::{ensure_positive, ConfigError, ConfigResult};

/// Distance estimate from a node to the start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// `|dx| + |dz|`. Overestimates diagonal moves, so paths may be
    /// slightly longer than optimal.
    #[default]
    Manhattan,
    /// `max + (sqrt(2) - 1) * min`. Exact on an empty grid; paths are
    /// optimal.
    Octile,
}

impl Heuristic {
    /// Estimate for a step of `(dx, dz)` cells.
    #[inline]
    #[must_use]
    pub fn estimate(self, dx: i32, dz: i32) -> f32 {
        let ax = dx.unsigned_abs() as f32;
        let az = dz.unsigned_abs() as f32;
        match self {
            Self::Manhattan => ax + az,
            Self::Octile => ax.max(az) + (std::f32::consts::SQRT_2 - 1.0) * ax.min(az),
        }
    }
}

/// Bounds of one search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Nodes at or beyond this Euclidean distance from the start, in
    /// cells, are never created.
    pub max_distance: u32,
    /// Height the ground probe starts from.
    pub max_height: f32,
    /// Radius of the obstacle sphere probed above each cell.
    pub probe_radius: f32,
    /// Distance estimate used in node keys.
    pub heuristic: Heuristic,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_distance: 32,
            max_height: 256.0,
            probe_radius: 1.5,
            heuristic: Heuristic::Manhattan,
        }
    }
}

impl SearchConfig {
    /// Checks the search bounds.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a `ConfigError`.
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_positive("max_distance", u64::from(self.max_distance))?;
        ensure_finite_positive("max_height", self.max_height)?;
        ensure_finite_positive("probe_radius", self.probe_radius)?;
        Ok(())
    }
}

/// When an agent plans, retries and repairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// At or inside this distance to the target the agent is `Near`.
    pub min_distance: f32,
    /// Beyond this distance the agent is `Far` and stops pathing.
    pub max_distance: f32,
    /// Target movement since the last plan that forces a fresh plan.
    pub replan_distance: f32,
    /// Wait after a failed plan before trying again, in seconds.
    pub retry_delay_secs: f32,
    /// Interval between incremental repairs of the current path, in seconds.
    pub repair_interval_secs: f32,
    /// Planar distance at which a waypoint counts as reached.
    pub arrive_tolerance: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 32.0,
            replan_distance: 16.0,
            retry_delay_secs: 3.0,
            repair_interval_secs: 1.0,
            arrive_tolerance: 0.05,
        }
    }
}

impl AgentConfig {
    /// Failed-plan backoff.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f32(self.retry_delay_secs)
    }

    /// Repair period.
    #[must_use]
    pub fn repair_interval(&self) -> Duration {
        Duration::from_secs_f32(self.repair_interval_secs)
    }

    /// Search bounds matching this agent's reach.
    #[must_use]
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_distance: self.max_distance.ceil() as u32,
            ..SearchConfig::default()
        }
    }

    /// Checks distances and timers.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a `ConfigError`.
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_finite_positive("min_distance", self.min_distance)?;
        ensure_finite_positive("max_distance", self.max_distance)?;
        if self.max_distance <= self.min_distance {
            return Err(ConfigError::OutOfRange {
                field: "max_distance",
                value: self.max_distance,
                range: "(min_distance, inf)",
            });
        }
        ensure_finite_positive("replan_distance", self.replan_distance)?;
        ensure_finite_positive("retry_delay_secs", self.retry_delay_secs)?;
        ensure_finite_positive("repair_interval_secs", self.repair_interval_secs)?;
        ensure_finite_positive("arrive_tolerance", self.arrive_tolerance)?;
        Ok(())
    }
}

fn ensure_finite_positive(field: &'static str, value: f32) -> ConfigResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            range: "(0, inf)",
        })
    }
}
