//! Worker thread logic for the phased bitonic sort
//!
//! Each worker:
//! - Is bound to one slot of the coordination table for the whole run
//! - Claims the task of its slot for every published phase
//! - Runs Sort/Merge tasks through the kernel on its exclusive range
//! - Reports completion, which may close the phase
//! - Exits after completing a Terminate task

use super::kernel;
use super::observer::PhaseObserver;
use super::state::CoordinationState;
use super::task::{Assignment, Task};
use crate::error::{panic_message, WorkerError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{debug, error, trace};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Sort tasks executed
    pub sorts: AtomicU64,

    /// Merge tasks executed
    pub merges: AtomicU64,

    /// Phases in which the slot had no task
    pub idle: AtomicU64,

    /// Elements covered by executed tasks
    pub elements: AtomicU64,
}

impl WorkerStats {
    fn record_sort(&self, count: usize) {
        self.sorts.fetch_add(1, Ordering::Relaxed);
        self.elements.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_merge(&self, count: usize) {
        self.merges.fetch_add(1, Ordering::Relaxed);
        self.elements.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_idle(&self) {
        self.idle.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals over the whole pool
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub sorts: u64,
    pub merges: u64,
    pub idle: u64,
    pub elements: u64,
}

/// A worker thread bound to one slot
pub struct Worker<'scope> {
    /// Slot index
    slot: usize,

    /// Thread handle
    handle: Option<ScopedJoinHandle<'scope, Result<(), WorkerError>>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl<'scope> Worker<'scope> {
    /// Spawn a worker thread for `slot` inside `scope`
    pub fn spawn<'env, O>(
        scope: &'scope Scope<'scope, 'env>,
        slot: usize,
        state: &'env CoordinationState,
        observer: &'env O,
    ) -> Result<Self, WorkerError>
    where
        O: PhaseObserver,
    {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);
        let name = format!("bitonic-worker-{}", slot);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn_scoped(scope, move || {
                worker_loop(slot, state, observer, &stats_clone)
            })
            .map_err(|e| WorkerError::SpawnFailed {
                name,
                reason: e.to_string(),
            })?;

        Ok(Self {
            slot,
            handle: Some(handle),
            stats,
        })
    }

    /// Get the slot index
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result,
                Err(payload) => Err(WorkerError::Panicked {
                    slot: self.slot,
                    message: panic_message(payload.as_ref()),
                }),
            }
        } else {
            Ok(())
        }
    }
}

/// Main worker loop
fn worker_loop<O: PhaseObserver>(
    slot: usize,
    state: &CoordinationState,
    observer: &O,
    stats: &WorkerStats,
) -> Result<(), WorkerError> {
    debug!(slot, "Worker starting");
    let mut failure = None;

    loop {
        let Assignment { phase, task } = state.claim(slot);

        match task {
            Task::Sort { .. } | Task::Merge { .. } => {
                observer.task_started(slot, phase, &task);
                if let Err(e) = run_task(slot, state, &task, stats) {
                    error!(slot, phase, error = %e, "Task could not run");
                    failure.get_or_insert(e);
                }
                observer.task_finished(slot, phase, &task);
            }
            Task::Idle => {
                stats.record_idle();
            }
            Task::Terminate => {
                state.complete(slot);
                break;
            }
        }

        state.complete(slot);
    }

    debug!(
        slot,
        sorts = stats.sorts.load(Ordering::Relaxed),
        merges = stats.merges.load(Ordering::Relaxed),
        "Worker terminated"
    );

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Execute a Sort or Merge task on its range of the shared array
fn run_task(
    slot: usize,
    state: &CoordinationState,
    task: &Task,
    stats: &WorkerStats,
) -> Result<(), WorkerError> {
    let array = state.array().ok_or(WorkerError::MissingArray { slot })?;

    match *task {
        Task::Sort {
            start,
            count,
            direction,
        } => {
            // SAFETY: tasks of one phase cover disjoint ranges, and the
            // phase cannot advance before this slot completes.
            let values = unsafe { array.range_mut(start..start + count) };
            kernel::sort_slice(values, direction);
            stats.record_sort(count);
        }
        Task::Merge {
            start,
            count,
            direction,
        } => {
            // SAFETY: as above.
            let values = unsafe { array.range_mut(start..start + count) };
            kernel::merge_slice(values, direction);
            stats.record_merge(count);
        }
        Task::Terminate | Task::Idle => {}
    }

    trace!(slot, task = task.kind(), "Task done");
    Ok(())
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker<'_>]) -> PoolStats {
    let mut totals = PoolStats::default();

    for worker in workers {
        totals.sorts += worker.stats.sorts.load(Ordering::Relaxed);
        totals.merges += worker.stats.merges.load(Ordering::Relaxed);
        totals.idle += worker.stats.idle.load(Ordering::Relaxed);
        totals.elements += worker.stats.elements.load(Ordering::Relaxed);
    }

    totals
}
