//! # Path Agent
//!
//! Per-agent pathing policy on top of `DStarLite`.
//!
//! ## Policy
//!
//! - `Far` (beyond `max_distance`) and `Near` (within `min_distance`)
//!   agents do not path.
//! - A `Movable` agent plans from scratch when it has no waypoints left and
//!   the retry timer has run out, or when the target moved more than
//!   `replan_distance` since the last plan.
//! - A failed plan arms the retry timer. Failures never leave `tick`.
//! - Every `repair_interval` the current path is repaired in place with
//!   `update_obstacles`.
//! - Waypoints are handed out one at a time and dropped once reached.

use std::collections::VecDeque;
use std::time::Duration;

use wildgrove_shared::{ConfigResult, Vec3};

use crate::config::{AgentConfig, SearchConfig};
use crate::dstar::DStarLite;
use crate::error::NavError;
use crate::grid::GridPos;
use crate::oracle::TerrainOracle;

/// How far the agent is from its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistanceStatus {
    /// Close enough to act on the target.
    Near,
    /// In pathing range.
    Movable,
    /// Out of range; the agent idles.
    Far,
}

/// What the agent decided this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentStep {
    /// Distance band this tick.
    pub status: DistanceStatus,
    /// Where to move next, on the ground.
    pub waypoint: Option<Vec3>,
    /// A fresh plan was attempted.
    pub replanned: bool,
    /// The current path was repaired.
    pub repaired: bool,
}

/// Pathing state of one agent chasing one target.
#[derive(Debug)]
pub struct PathAgent {
    config: AgentConfig,
    search: SearchConfig,
    planner: Option<DStarLite>,
    waypoints: VecDeque<GridPos>,
    /// Target position at the last plan attempt.
    last_target: Option<Vec3>,
    retry_in: Duration,
    repair_in: Duration,
    failures: u32,
}

impl PathAgent {
    /// Creates an agent whose search radius matches its reach.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in `config`.
    pub fn new(config: AgentConfig) -> ConfigResult<Self> {
        let search = config.search_config();
        Self::with_search(config, search)
    }

    /// Creates an agent with explicit search bounds.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in either config.
    pub fn with_search(config: AgentConfig, search: SearchConfig) -> ConfigResult<Self> {
        config.validate()?;
        search.validate()?;
        Ok(Self {
            config,
            search,
            planner: None,
            waypoints: VecDeque::new(),
            last_target: None,
            retry_in: Duration::ZERO,
            repair_in: Duration::ZERO,
            failures: 0,
        })
    }

    /// Distance band between `position` and `target`.
    #[must_use]
    pub fn status(&self, position: Vec3, target: Vec3) -> DistanceStatus {
        let distance = position.distance(target);
        if distance > self.config.max_distance {
            DistanceStatus::Far
        } else if distance > self.config.min_distance {
            DistanceStatus::Movable
        } else {
            DistanceStatus::Near
        }
    }

    /// Advances the agent by `dt`.
    pub fn tick<O: TerrainOracle + ?Sized>(
        &mut self,
        oracle: &O,
        position: Vec3,
        target: Vec3,
        dt: Duration,
    ) -> AgentStep {
        self.retry_in = self.retry_in.saturating_sub(dt);
        self.repair_in = self.repair_in.saturating_sub(dt);

        let status = self.status(position, target);
        let mut step = AgentStep {
            status,
            waypoint: None,
            replanned: false,
            repaired: false,
        };
        if status != DistanceStatus::Movable {
            return step;
        }

        if self.should_replan(target) {
            self.replan(oracle, position, target);
            step.replanned = true;
        } else if self.repair_in.is_zero() && self.planner.is_some() {
            step.repaired = self.repair(oracle, position);
        }

        self.drop_reached(position);
        step.waypoint = self
            .waypoints
            .front()
            .map(|&cell| cell.to_world(oracle.ground_height(cell.x as f32, cell.z as f32, self.search.max_height)));
        step
    }

    /// Remaining waypoints, next first.
    pub fn waypoints(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.waypoints.iter().copied()
    }

    /// Returns true if there are waypoints left.
    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.waypoints.is_empty()
    }

    /// The search behind the current path, if any.
    #[must_use]
    pub const fn planner(&self) -> Option<&DStarLite> {
        self.planner.as_ref()
    }

    /// Failed plans since the last success.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Time until a failed plan may be retried.
    #[must_use]
    pub const fn retry_in(&self) -> Duration {
        self.retry_in
    }

    /// Agent policy.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Drops the current path; the next `Movable` tick plans again.
    pub fn clear_path(&mut self) {
        self.planner = None;
        self.waypoints.clear();
    }

    fn should_replan(&self, target: Vec3) -> bool {
        if self
            .last_target
            .is_some_and(|last| last.distance(target) > self.config.replan_distance)
        {
            return true;
        }
        self.retry_in.is_zero() && self.waypoints.is_empty()
    }

    fn replan<O: TerrainOracle + ?Sized>(&mut self, oracle: &O, position: Vec3, target: Vec3) {
        self.last_target = Some(target);
        self.clear_path();

        let planned = DStarLite::new(position, target, self.search.clone()).and_then(|mut planner| {
            let path = planner.calculate_path(oracle)?.to_vec();
            Ok((planner, path))
        });
        match planned {
            Ok((planner, path)) => {
                self.waypoints.extend(path);
                self.planner = Some(planner);
                self.repair_in = self.config.repair_interval();
                self.failures = 0;
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Repairs in place and resumes from where the agent is. Returns true
    /// if the agent still has a path.
    fn repair<O: TerrainOracle + ?Sized>(&mut self, oracle: &O, position: Vec3) -> bool {
        self.repair_in = self.config.repair_interval();
        let Some(planner) = self.planner.as_mut() else {
            return false;
        };
        let Some(next) = self.waypoints.front().copied() else {
            return false;
        };
        let here = GridPos::from_world(position);
        let origin = planner.start();

        match planner.update_obstacles(oracle).map(<[GridPos]>::to_vec) {
            Ok(path) => {
                let resume = path
                    .iter()
                    .position(|&cell| cell == next)
                    .or_else(|| (here == origin).then_some(0))
                    .or_else(|| path.iter().position(|&cell| cell == here).map(|i| i + 1));
                if let Some(index) = resume {
                    self.waypoints = path[index..].iter().copied().collect();
                    true
                } else {
                    tracing::debug!("Repaired path no longer passes {}, planning again", here);
                    self.clear_path();
                    false
                }
            }
            Err(e) => {
                self.clear_path();
                self.fail(&e);
                false
            }
        }
    }

    fn fail(&mut self, error: &NavError) {
        self.failures += 1;
        self.retry_in = self.config.retry_delay();
        tracing::debug!(
            "No path this tick ({}), retrying in {:.1}s",
            error,
            self.retry_in.as_secs_f32()
        );
    }

    fn drop_reached(&mut self, position: Vec3) {
        while let Some(&next) = self.waypoints.front() {
            let dx = (position.x - next.x as f32).abs();
            let dz = (position.z - next.z as f32).abs();
            if dx + dz > self.config.arrive_tolerance {
                break;
            }
            self.waypoints.pop_front();
        }
    }
}
