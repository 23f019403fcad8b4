//! Hooks called at phase and task boundaries
//!
//! The distributor reports phases, workers report tasks. Workers call
//! `task_finished` before marking their slot complete, so every hook of a
//! phase happens before the first hook of the next one.

use super::task::Task;
use std::time::Duration;

/// A sort or merge phase as planned by the distributor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    /// Phase number as assigned by the coordination state
    pub phase: u64,

    /// Work phases planned in total for this run
    pub total: usize,

    /// Kind of the phase
    pub kind: PhaseKind,

    /// Elements per task in this phase
    pub width: usize,

    /// Number of sort/merge tasks in this phase
    pub tasks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// Initial partition-and-sort
    Sort,

    /// One level of the merge cascade
    Merge,
}

/// Receives progress events from a running engine
///
/// All methods default to doing nothing. Implementations are shared between
/// threads and must be cheap.
pub trait PhaseObserver: Sync {
    /// Called by the distributor right after a phase is published
    fn phase_started(&self, _info: &PhaseInfo) {}

    /// Called by the distributor once the phase has drained
    fn phase_finished(&self, _info: &PhaseInfo, _elapsed: Duration) {}

    /// Called by a worker before running a sort or merge task
    fn task_started(&self, _slot: usize, _phase: u64, _task: &Task) {}

    /// Called by a worker after running a task, before completing its slot
    fn task_finished(&self, _slot: usize, _phase: u64, _task: &Task) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PhaseObserver for NoopObserver {}
