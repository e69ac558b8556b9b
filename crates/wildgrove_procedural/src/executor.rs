//! # Synthesis Executors
//!
//! Synthesis is the only work that leaves the tick thread. An executor
//! takes chunk coordinates, synthesizes their tiles somewhere, and hands
//! the outcomes back when the tick thread asks for them. The tick thread
//! never blocks on an executor unless it calls `wait_for_any`.
//!
//! ## Executors
//!
//! - `ThreadedExecutor`: N worker threads fed by a crossbeam job channel,
//!   reporting through a completion channel
//! - `InlineExecutor`: synthesizes on dispatch; deterministic, for tests and
//!   single-threaded hosts
//!
//! ## Teardown
//!
//! Shutting down (or dropping) a `ThreadedExecutor` closes the job channel,
//! lets the workers finish what they already took, joins them, and drops
//! every tile that was never collected.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::chunk::{ChunkCoord, HeightmapTile};
use crate::config::GenerationConfig;
use crate::error::{SynthesisError, SynthesisResult};
use crate::noise::NoiseField;
use crate::synthesis::TerrainSynthesizer;

/// A finished synthesis task.
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// Chunk that was synthesized.
    pub coord: ChunkCoord,
    /// The tile, or why there is none.
    pub result: SynthesisResult<HeightmapTile>,
}

/// Runs synthesis tasks and reports their outcomes.
pub trait SynthesisExecutor {
    /// Starts synthesizing `coord`.
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::ExecutorShutDown` once the executor stopped
    /// accepting work.
    fn dispatch(&mut self, coord: ChunkCoord) -> SynthesisResult<()>;

    /// Returns every outcome that is ready, without blocking.
    fn try_collect(&mut self) -> Vec<SynthesisOutcome>;

    /// Blocks until at least one outcome is ready or `timeout` elapses,
    /// then returns every ready outcome. Returns immediately when nothing
    /// is in flight.
    fn wait_for_any(&mut self, timeout: Duration) -> Vec<SynthesisOutcome>;

    /// Tasks dispatched and not yet collected.
    fn in_flight(&self) -> usize;

    /// Stops accepting work, finishes or abandons outstanding tasks and
    /// releases their tiles. Idempotent.
    fn shutdown(&mut self);
}

/// Counters kept by a `ThreadedExecutor`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Tasks accepted by `dispatch`.
    pub dispatched: u64,
    /// Tasks that produced a tile.
    pub completed: u64,
    /// Tasks that produced an error.
    pub failed: u64,
    /// Wall time spent inside synthesis across all workers.
    pub busy_time: Duration,
}

/// Worker-thread executor.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use wildgrove_procedural::{
///     ChunkCoord, GenerationConfig, SynthesisExecutor, TerrainSynthesizer, ThreadedExecutor,
/// };
///
/// let config = Arc::new(GenerationConfig::default());
/// let synth = Arc::new(TerrainSynthesizer::from_seed(config.seed));
/// let mut executor = ThreadedExecutor::new(synth, config, 2);
///
/// executor.dispatch(ChunkCoord::new(0, 0)).unwrap();
/// let outcomes = executor.wait_for_any(Duration::from_secs(5));
/// assert_eq!(outcomes[0].coord, ChunkCoord::new(0, 0));
/// assert!(outcomes[0].result.is_ok());
/// ```
pub struct ThreadedExecutor {
    /// Job channel; `None` after shutdown.
    jobs: Option<Sender<ChunkCoord>>,
    /// Completion channel.
    done: Receiver<SynthesisOutcome>,
    /// Worker thread handles.
    workers: Vec<JoinHandle<()>>,
    /// Dispatched minus collected.
    in_flight: usize,
    /// Shared with workers.
    stats: Arc<Mutex<ExecutorStats>>,
}

impl ThreadedExecutor {
    /// Spawns `threads` workers (at least one) sharing `synthesizer` and `config`.
    #[must_use]
    pub fn new<N: NoiseField + 'static>(
        synthesizer: Arc<TerrainSynthesizer<N>>,
        config: Arc<GenerationConfig>,
        threads: usize,
    ) -> Self {
        let (job_tx, job_rx) = unbounded::<ChunkCoord>();
        let (done_tx, done_rx) = unbounded::<SynthesisOutcome>();
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));

        let workers = (0..threads.max(1))
            .map(|_| {
                let synthesizer = Arc::clone(&synthesizer);
                let config = Arc::clone(&config);
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                let stats = Arc::clone(&stats);
                thread::spawn(move || Self::worker_loop(&*synthesizer, &config, &jobs, &done, &stats))
            })
            .collect();

        tracing::debug!("Synthesis executor started with {} workers", threads.max(1));

        Self {
            jobs: Some(job_tx),
            done: done_rx,
            workers,
            in_flight: 0,
            stats,
        }
    }

    /// Worker thread main loop. Exits when the job channel closes or the
    /// completion receiver is gone.
    fn worker_loop<N: NoiseField>(
        synthesizer: &TerrainSynthesizer<N>,
        config: &GenerationConfig,
        jobs: &Receiver<ChunkCoord>,
        done: &Sender<SynthesisOutcome>,
        stats: &Mutex<ExecutorStats>,
    ) {
        while let Ok(coord) = jobs.recv() {
            let started = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| synthesizer.synthesize(coord, config)))
                .unwrap_or_else(|payload| {
                    Err(SynthesisError::WorkerPanicked {
                        coord,
                        message: panic_message(payload.as_ref()),
                    })
                });

            {
                let mut stats = stats.lock();
                stats.busy_time += started.elapsed();
                if result.is_ok() {
                    stats.completed += 1;
                } else {
                    stats.failed += 1;
                }
            }

            if done.send(SynthesisOutcome { coord, result }).is_err() {
                break;
            }
        }
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        *self.stats.lock()
    }

    /// Number of worker threads still attached.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl SynthesisExecutor for ThreadedExecutor {
    fn dispatch(&mut self, coord: ChunkCoord) -> SynthesisResult<()> {
        let jobs = self.jobs.as_ref().ok_or(SynthesisError::ExecutorShutDown(coord))?;
        jobs.send(coord).map_err(|_| SynthesisError::ExecutorShutDown(coord))?;
        self.in_flight += 1;
        self.stats.lock().dispatched += 1;
        Ok(())
    }

    fn try_collect(&mut self) -> Vec<SynthesisOutcome> {
        let ready: Vec<SynthesisOutcome> = self.done.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(ready.len());
        ready
    }

    fn wait_for_any(&mut self, timeout: Duration) -> Vec<SynthesisOutcome> {
        if self.in_flight == 0 {
            return Vec::new();
        }
        let first = match self.done.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return Vec::new(),
        };
        let mut ready = vec![first];
        ready.extend(self.done.try_iter());
        self.in_flight = self.in_flight.saturating_sub(ready.len());
        ready
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn shutdown(&mut self) {
        // Closing the job channel ends every worker loop once the queue drains.
        if self.jobs.take().is_none() {
            return;
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("Synthesis worker exited abnormally");
            }
        }
        let abandoned = self.done.try_iter().count();
        self.in_flight = 0;
        tracing::debug!("Synthesis executor shut down, released {} uncollected tiles", abandoned);
    }
}

impl Drop for ThreadedExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedExecutor")
            .field("workers", &self.workers.len())
            .field("in_flight", &self.in_flight)
            .field("accepting", &self.jobs.is_some())
            .finish_non_exhaustive()
    }
}

/// Executor that synthesizes on the calling thread at dispatch time.
///
/// Outcomes are held until the next `try_collect`, so the streaming state
/// machine sees the same Pending -> Completed transition as with threads.
#[derive(Debug)]
pub struct InlineExecutor<N: NoiseField> {
    synthesizer: Arc<TerrainSynthesizer<N>>,
    config: Arc<GenerationConfig>,
    ready: VecDeque<SynthesisOutcome>,
    open: bool,
}

impl<N: NoiseField> InlineExecutor<N> {
    /// Creates an inline executor.
    #[must_use]
    pub fn new(synthesizer: Arc<TerrainSynthesizer<N>>, config: Arc<GenerationConfig>) -> Self {
        Self {
            synthesizer,
            config,
            ready: VecDeque::new(),
            open: true,
        }
    }
}

impl<N: NoiseField> SynthesisExecutor for InlineExecutor<N> {
    fn dispatch(&mut self, coord: ChunkCoord) -> SynthesisResult<()> {
        if !self.open {
            return Err(SynthesisError::ExecutorShutDown(coord));
        }
        let result = self.synthesizer.synthesize(coord, &self.config);
        self.ready.push_back(SynthesisOutcome { coord, result });
        Ok(())
    }

    fn try_collect(&mut self) -> Vec<SynthesisOutcome> {
        self.ready.drain(..).collect()
    }

    fn wait_for_any(&mut self, _timeout: Duration) -> Vec<SynthesisOutcome> {
        self.try_collect()
    }

    fn in_flight(&self) -> usize {
        self.ready.len()
    }

    fn shutdown(&mut self) {
        self.open = false;
        self.ready.clear();
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
