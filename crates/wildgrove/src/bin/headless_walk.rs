//! # Headless Walk
//!
//! Streams terrain around an observer walking across the world on worker
//! threads, with a pathing agent chasing the observer over the streamed
//! heightmaps. No GPU, no window.
//!
//! ```bash
//! # Default world
//! RUST_LOG=info ./headless_walk
//!
//! # World from a TOML file ([generation] and [streaming] tables)
//! RUST_LOG=wildgrove_procedural=debug ./headless_walk world.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use wildgrove::navigation::{AgentConfig, DistanceStatus, PathAgent};
use wildgrove::procedural::{ChunkStreamer, ConfigError, StreamingError, WorldConfig};
use wildgrove::shared::Vec3;
use wildgrove::WalkSession;

/// Simulation step.
const STEP: Duration = Duration::from_millis(50);

/// Steps to walk (20 seconds).
const STEPS: u64 = 400;

/// Observer walking velocity, units per second.
const HEADING: Vec3 = Vec3::new(6.0, 0.0, 2.5);

/// Follower speed, units per second.
const FOLLOWER_SPEED: f32 = 5.0;

/// How long to wait for the spawn area.
const SPAWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Steps between progress lines.
const REPORT_EVERY: u64 = 40;

#[derive(Debug, Error)]
enum WalkError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Streaming(#[from] StreamingError),
}

fn load_config() -> Result<WorldConfig, WalkError> {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return Ok(WorldConfig::default());
    };
    let text = std::fs::read_to_string(&path).map_err(|source| WalkError::Read {
        path: path.clone(),
        source,
    })?;
    let config = WorldConfig::from_toml_str(&text)?;
    tracing::info!("Loaded world config from {}", path.display());
    Ok(config)
}

fn run() -> Result<(), WalkError> {
    let config = load_config()?;
    let streamer = ChunkStreamer::threaded(&config)?;
    let agent = PathAgent::new(AgentConfig::default())?;

    let started = Instant::now();
    let mut session = WalkSession::bootstrap(streamer, agent, FOLLOWER_SPEED, SPAWN_TIMEOUT)?;
    tracing::info!("Spawn area ready after {:?}", started.elapsed());

    let mut committed = 0usize;
    let mut failed = 0usize;
    let mut far_steps = 0u64;

    for step in 1..=STEPS {
        let frame_start = Instant::now();
        let frame = session.step(HEADING, STEP);

        committed += frame.streaming.committed.len();
        failed += frame.streaming.failed.len();
        if frame.agent.status == DistanceStatus::Far {
            far_steps += 1;
        }

        if step % REPORT_EVERY == 0 {
            tracing::info!(
                "step {:>4}: observer ({:.1}, {:.1}, {:.1}) chunk {} | {} loaded, {} pending | follower {:.1} away, {:?}",
                step,
                frame.observer.x,
                frame.observer.y,
                frame.observer.z,
                session.streamer().observer_chunk(),
                session.streamer().store().len(),
                session.streamer().pending_count(),
                frame.follower.horizontal_distance(frame.observer),
                frame.agent.status
            );
        }

        if let Some(rest) = STEP.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    tracing::info!(
        "Walked {:.0} units: {} tiles committed, {} synthesis failures, follower out of range for {} steps",
        session.observer().horizontal_distance(session.spawn().position),
        committed,
        failed,
        far_steps
    );
    session.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("headless walk failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
