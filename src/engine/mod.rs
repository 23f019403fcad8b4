//! Phase-synchronized bitonic sort engine
//!
//! The engine sorts a power-of-two sized `Vec<i32>` with one distributor
//! thread and a fixed pool of worker threads.
//!
//! # Architecture
//!
//! ```text
//!                     ┌──────────────────────────┐
//!                     │       Distributor        │
//!                     │  - loads/validates array │
//!                     │  - plans phase tables    │
//!                     └────────────┬─────────────┘
//!                                  │ publish / wait drained
//!                     ┌────────────▼─────────────┐
//!                     │    CoordinationState     │
//!                     │  - task per slot         │
//!                     │  - completion flags      │
//!                     └────────────┬─────────────┘
//!                                  │ claim / complete
//!       ┌──────────────────────────┼──────────────────────────┐
//!       │                          │                          │
//! ┌─────▼─────┐              ┌─────▼─────┐              ┌─────▼─────┐
//! │  Worker 0 │              │  Worker 1 │              │  Worker N │
//! │  kernel   │              │  kernel   │              │  kernel   │
//! └───────────┘              └───────────┘              └───────────┘
//! ```
//!
//! All threads live inside one `std::thread::scope`; the coordination state
//! is borrowed by every thread and handed back to the caller afterwards.

pub mod distributor;
pub mod kernel;
pub mod observer;
pub mod shared;
pub mod state;
pub mod task;
pub mod worker;

pub use distributor::{
    validate_layout, DistributionReport, Distributor, PhasePlan, PhaseTiming, Step,
};
pub use observer::{NoopObserver, PhaseInfo, PhaseKind, PhaseObserver};
pub use state::CoordinationState;
pub use task::{Assignment, Direction, Task};
pub use worker::{aggregate_stats, PoolStats, Worker, WorkerStats};

use crate::config::SortConfig;
use crate::error::{panic_message, ConfigError, FormatError, Result, SortError, WorkerError};
use crate::input::InputFile;
use distributor::release_workers;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Maximum worker pool size
pub const MAX_WORKERS: usize = 1024;

/// Result of a completed sort
#[derive(Debug)]
pub struct SortReport {
    /// The ordered values
    pub values: Vec<i32>,

    /// Order the values were sorted into
    pub direction: Direction,

    /// Worker pool size (0 for a sequential run)
    pub workers: usize,

    /// Completed sort/merge phases
    pub phases: Vec<PhaseTiming>,

    /// Work done by the pool
    pub pool: PoolStats,

    /// Wall time of the run, thread start-up included
    pub duration: Duration,
}

impl SortReport {
    /// Number of sort/merge phases that ran
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Elements sorted per second
    pub fn elements_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.values.len() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Sorts arrays with a fixed pool of workers
#[derive(Debug, Clone, Copy)]
pub struct SortEngine {
    workers: usize,
    direction: Direction,
}

impl SortEngine {
    /// Create an engine with `workers` slots sorting into `direction`
    pub fn new(workers: usize, direction: Direction) -> std::result::Result<Self, ConfigError> {
        if workers == 0 || workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: workers,
                max: MAX_WORKERS,
            });
        }
        Ok(Self { workers, direction })
    }

    /// Create an engine from validated configuration
    pub fn from_config(config: &SortConfig) -> Self {
        Self {
            workers: config.worker_count,
            direction: config.direction,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sort `values`
    ///
    /// The layout is validated before any thread is started.
    pub fn sort(&self, values: Vec<i32>) -> Result<SortReport> {
        self.sort_observed(values, &NoopObserver)
    }

    /// Sort `values`, reporting phase and task events to `observer`
    pub fn sort_observed<O: PhaseObserver>(
        &self,
        values: Vec<i32>,
        observer: &O,
    ) -> Result<SortReport> {
        self.sort_checked(values.len(), move || Ok(values), observer)
    }

    /// Sort the payload of an opened input file
    ///
    /// The header length is checked against the pool before any thread is
    /// started; the payload itself is read on the distributor thread.
    pub fn sort_input<O: PhaseObserver>(
        &self,
        input: InputFile,
        observer: &O,
    ) -> Result<SortReport> {
        self.sort_checked(input.len(), move || input.read_values(), observer)
    }

    /// Validate the announced `size`, then sort what `load` produces
    fn sort_checked<F, O>(&self, size: usize, load: F, observer: &O) -> Result<SortReport>
    where
        F: FnOnce() -> Result<Vec<i32>> + Send,
        O: PhaseObserver,
    {
        validate_layout(size, self.workers)?;
        self.sort_with(load, observer)
    }

    /// Sort the array produced by `load`
    ///
    /// `load` runs on the distributor thread while the workers are already
    /// waiting. If it fails, or produces an array the pool cannot split,
    /// every worker is released before the error is returned.
    pub fn sort_with<F, O>(&self, load: F, observer: &O) -> Result<SortReport>
    where
        F: FnOnce() -> Result<Vec<i32>> + Send,
        O: PhaseObserver,
    {
        let start = Instant::now();
        let state = CoordinationState::new(self.workers)?;
        let distributor = Distributor::new(&state, self.direction, observer)?;

        info!(
            workers = self.workers,
            direction = %self.direction,
            "Starting sort"
        );

        let (report, pool) = thread::scope(|s| -> Result<(DistributionReport, PoolStats)> {
            let mut workers = Vec::with_capacity(self.workers);
            for slot in 0..self.workers {
                match Worker::spawn(s, slot, &state, observer) {
                    Ok(worker) => workers.push(worker),
                    Err(e) => {
                        release_and_join(&state, workers);
                        return Err(e.into());
                    }
                }
            }
            info!(count = workers.len(), "Workers spawned");

            let handle = thread::Builder::new()
                .name("bitonic-distributor".into())
                .spawn_scoped(s, move || distributor.run(load));

            let distributed = match handle {
                Ok(handle) => match handle.join() {
                    Ok(result) => result,
                    Err(payload) => {
                        // Whatever phase was open still drains; then retire everyone.
                        if let Err(e) = release_workers(&state, self.workers) {
                            warn!(error = %e, "Could not release workers");
                        }
                        Err(WorkerError::DistributorPanicked {
                            message: panic_message(payload.as_ref()),
                        }
                        .into())
                    }
                },
                Err(e) => {
                    release_and_join(&state, workers);
                    return Err(WorkerError::SpawnFailed {
                        name: "bitonic-distributor".into(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            };

            let pool = aggregate_stats(&workers);
            let joined = join_workers(workers);

            let report = distributed?;
            joined?;
            Ok((report, pool))
        })?;

        let values = take_array(state)?;

        if let Some(index) = kernel::first_disorder(&values, self.direction) {
            return Err(SortError::Unsorted { index });
        }

        let duration = start.elapsed();
        info!(
            size = values.len(),
            phases = report.phases.len(),
            duration_ms = duration.as_millis() as u64,
            "Sort completed"
        );

        Ok(SortReport {
            values,
            direction: self.direction,
            workers: self.workers,
            phases: report.phases,
            pool,
            duration,
        })
    }
}

/// Sort `values` on the calling thread with the kernel alone
pub fn sort_sequential(mut values: Vec<i32>, direction: Direction) -> Result<SortReport> {
    if !values.len().is_power_of_two() {
        return Err(FormatError::NotPowerOfTwo { size: values.len() }.into());
    }

    let start = Instant::now();
    kernel::sort_slice(&mut values, direction);
    let duration = start.elapsed();

    if let Some(index) = kernel::first_disorder(&values, direction) {
        return Err(SortError::Unsorted { index });
    }

    let count = values.len();
    Ok(SortReport {
        values,
        direction,
        workers: 0,
        phases: Vec::new(),
        pool: PoolStats {
            sorts: 1,
            elements: count as u64,
            ..PoolStats::default()
        },
        duration,
    })
}

/// Recover the array once every thread has finished
fn take_array(state: CoordinationState) -> std::result::Result<Vec<i32>, WorkerError> {
    state.into_array().ok_or(WorkerError::ArrayNotReturned)
}

/// Release the already spawned workers and wait for them
fn release_and_join(state: &CoordinationState, workers: Vec<Worker<'_>>) {
    if let Err(e) = release_workers(state, workers.len()) {
        warn!(error = %e, "Could not release workers");
    }
    let _ = join_workers(workers);
}

/// Join all workers, returning the first failure
fn join_workers(workers: Vec<Worker<'_>>) -> std::result::Result<(), WorkerError> {
    let mut first = None;
    for worker in workers {
        let slot = worker.slot();
        if let Err(e) = worker.join() {
            warn!(slot, error = %e, "Worker failed to join cleanly");
            first.get_or_insert(e);
        }
    }
    match first {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
