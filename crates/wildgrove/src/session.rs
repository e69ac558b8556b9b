//! # Walk Session
//!
//! A fixed-step loop over one streamer, one walking observer and one agent
//! following it. This is the smallest complete host: no renderer, no
//! physics, and the streamed heightmaps are the only world.
//!
//! ```text
//! step(heading, dt):
//!   1. move the observer along `heading`, resting on loaded ground
//!   2. streamer.tick(observer)        evict, dispatch, commit
//!   3. oracle = store + water + blocked cells
//!   4. agent.tick(oracle, follower, observer)
//!   5. move the follower toward its waypoint
//! ```

use std::time::Duration;

use wildgrove_navigation::{AgentStep, BlockedCells, GridPos, PathAgent};
use wildgrove_procedural::{
    ChunkStreamer, NullRenderer, SpawnPoint, StreamingResult, SynthesisExecutor, TickReport,
};
use wildgrove_shared::{GroundProbe, Vec3};

use crate::world::WorldTerrainOracle;

/// Eye height of the observer above the ground.
pub const OBSERVER_EYE_HEIGHT: f32 = 1.0;

/// Everything that happened during one `WalkSession::step`.
#[derive(Debug, Clone)]
pub struct WalkFrame {
    /// Streaming work done this step.
    pub streaming: TickReport,
    /// What the follower's agent decided.
    pub agent: AgentStep,
    /// Observer position after moving.
    pub observer: Vec3,
    /// Follower position after moving.
    pub follower: Vec3,
}

/// An observer walking streamed terrain with an agent in pursuit.
#[derive(Debug)]
pub struct WalkSession<E: SynthesisExecutor> {
    streamer: ChunkStreamer<E>,
    renderer: NullRenderer,
    blocked: BlockedCells,
    agent: PathAgent,
    spawn: SpawnPoint,
    observer: Vec3,
    follower: Vec3,
    follower_speed: f32,
    steps: u64,
}

impl<E: SynthesisExecutor> WalkSession<E> {
    /// Waits for the spawn area, then places observer and follower on the
    /// spawn point.
    ///
    /// # Errors
    ///
    /// Returns the streamer's spawn-wait error.
    pub fn bootstrap(
        mut streamer: ChunkStreamer<E>,
        agent: PathAgent,
        follower_speed: f32,
        timeout: Duration,
    ) -> StreamingResult<Self> {
        let mut renderer = NullRenderer::new();
        let spawn = streamer.wait_for_spawn(&mut renderer, timeout)?;
        tracing::info!(
            "Session starts at ({:.1}, {:.1}, {:.1}) with {} chunks loaded",
            spawn.position.x,
            spawn.position.y,
            spawn.position.z,
            streamer.store().len()
        );
        Ok(Self {
            streamer,
            renderer,
            blocked: BlockedCells::new(),
            agent,
            spawn,
            observer: spawn.position,
            follower: spawn.position,
            follower_speed,
            steps: 0,
        })
    }

    /// Advances the world by `dt` with the observer walking along `heading`
    /// (horizontal units per second).
    pub fn step(&mut self, heading: Vec3, dt: Duration) -> WalkFrame {
        let seconds = dt.as_secs_f32();
        let moved = self.observer + heading.with_y(0.0) * seconds;
        self.observer = self.rest_on_ground(moved);

        let streaming = self.streamer.tick(self.observer, &mut self.renderer);

        let oracle = WorldTerrainOracle::new(self.streamer.store(), &self.blocked);
        let agent = self.agent.tick(&oracle, self.follower, self.observer, dt);
        if let Some(waypoint) = agent.waypoint {
            self.follower = move_toward(self.follower, waypoint, self.follower_speed * seconds);
        }

        self.steps += 1;
        WalkFrame {
            streaming,
            agent,
            observer: self.observer,
            follower: self.follower,
        }
    }

    /// Marks `cell` impassable for the follower.
    pub fn block(&mut self, cell: GridPos) -> bool {
        self.blocked.block(cell)
    }

    /// Current observer position.
    #[must_use]
    pub const fn observer(&self) -> Vec3 {
        self.observer
    }

    /// Current follower position.
    #[must_use]
    pub const fn follower(&self) -> Vec3 {
        self.follower
    }

    /// Where the session started.
    #[must_use]
    pub const fn spawn(&self) -> SpawnPoint {
        self.spawn
    }

    /// Steps taken so far.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// The streamer behind the session.
    #[must_use]
    pub const fn streamer(&self) -> &ChunkStreamer<E> {
        &self.streamer
    }

    /// The follower's agent.
    #[must_use]
    pub const fn agent(&self) -> &PathAgent {
        &self.agent
    }

    /// The headless renderer, for handle accounting.
    #[must_use]
    pub const fn renderer(&self) -> &NullRenderer {
        &self.renderer
    }

    /// Stops synthesis and unloads everything.
    pub fn shutdown(&mut self) {
        self.streamer.shutdown(&mut self.renderer);
        tracing::info!(
            "Session ended after {} steps, {} render handles released",
            self.steps,
            self.renderer.released()
        );
    }

    /// Keeps the height when the ground below is not loaded yet.
    fn rest_on_ground(&self, position: Vec3) -> Vec3 {
        let oracle = WorldTerrainOracle::new(self.streamer.store(), &self.blocked);
        if !oracle.is_loaded(position.x, position.z) {
            return position;
        }
        let ground = oracle.ground_height(position.x, position.z, f32::INFINITY);
        position.with_y(ground + OBSERVER_EYE_HEIGHT)
    }
}

/// Moves `from` toward `to` by at most `max_step`.
fn move_toward(from: Vec3, to: Vec3, max_step: f32) -> Vec3 {
    let delta = to - from;
    let length = delta.length();
    if length <= max_step || length <= f32::EPSILON {
        to
    } else {
        from + delta * (max_step / length)
    }
}
