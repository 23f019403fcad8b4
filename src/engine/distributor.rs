//! Distributor - plans and publishes the phases of a sort
//!
//! The distributor is the single producer of the coordination table. It runs
//! a small state machine:
//!
//! 1. Sort phase: `W` equal partitions, one `Sort` per slot, sub-direction
//!    alternating by partition parity
//! 2. Merge cascade: double the width, `size / width` `Merge` tasks, surplus
//!    slots get `Terminate` and are retired for good
//! 3. Close: `Terminate` for every slot still alive
//!
//! Every phase is published only after the previous one has drained.

use super::observer::{PhaseInfo, PhaseKind, PhaseObserver};
use super::state::CoordinationState;
use super::task::{Direction, Task};
use crate::error::{AllocationError, ConfigError, FormatError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Check that `size` elements can be sorted by `workers` slots
pub fn validate_layout(size: usize, workers: usize) -> Result<()> {
    if !size.is_power_of_two() {
        return Err(FormatError::NotPowerOfTwo { size }.into());
    }
    if workers == 0 || size % workers != 0 {
        return Err(ConfigError::UnevenPartition { size, workers }.into());
    }
    Ok(())
}

/// One step produced by a [`PhasePlan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A sort or merge phase
    Work {
        kind: PhaseKind,
        width: usize,
        tasks: usize,
    },

    /// Final table retiring every remaining slot
    Close,
}

/// Phase sequence for one array size and pool size
///
/// Pure bookkeeping, no synchronization: the distributor asks it to fill the
/// next table and publishes whatever it produced.
#[derive(Debug, Clone)]
pub struct PhasePlan {
    size: usize,
    workers: usize,
    direction: Direction,

    /// Width of the partitions already ordered (0 before the sort phase)
    width: usize,

    /// Slots that have not been sent `Terminate`
    active: usize,

    finished: bool,
}

impl PhasePlan {
    pub fn new(size: usize, workers: usize, direction: Direction) -> Self {
        Self {
            size,
            workers,
            direction,
            width: 0,
            active: workers,
            finished: false,
        }
    }

    /// Sort and merge phases this plan will produce
    pub fn work_phases(&self) -> usize {
        if self.size <= 1 {
            0
        } else {
            1 + self.workers.trailing_zeros() as usize
        }
    }

    /// Slots not yet retired
    pub fn active(&self) -> usize {
        self.active
    }

    /// Replace the contents of `table` with the next phase
    ///
    /// `table` never grows past the pool size. Returns `None` after the
    /// closing table has been produced.
    pub fn fill_next(&mut self, table: &mut Vec<Task>) -> Option<Step> {
        if self.finished {
            return None;
        }
        table.clear();

        if self.size > 1 && self.width == 0 {
            let width = self.size / self.workers;
            table.extend((0..self.workers).map(|i| Task::Sort {
                start: i * width,
                count: width,
                direction: self.direction.for_partition(i),
            }));
            self.width = width;

            return Some(Step::Work {
                kind: PhaseKind::Sort,
                width,
                tasks: self.workers,
            });
        }

        if self.size > 1 && self.width < self.size {
            let width = self.width * 2;
            let needed = self.size / width;
            table.extend((0..needed).map(|i| Task::Merge {
                start: i * width,
                count: width,
                direction: self.direction.for_partition(i),
            }));
            table.extend((needed..self.active).map(|_| Task::Terminate));
            self.width = width;
            self.active = needed;

            return Some(Step::Work {
                kind: PhaseKind::Merge,
                width,
                tasks: needed,
            });
        }

        table.extend((0..self.active).map(|_| Task::Terminate));
        self.active = 0;
        self.finished = true;
        Some(Step::Close)
    }
}

/// Timing of one completed sort/merge phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub phase: u64,
    pub kind: PhaseKind,
    pub width: usize,
    pub tasks: usize,
    pub elapsed: Duration,
}

/// What the distributor did during a run
#[derive(Debug, Clone, Default)]
pub struct DistributionReport {
    /// Number of elements sorted
    pub size: usize,

    /// Completed sort/merge phases, in order
    pub phases: Vec<PhaseTiming>,

    /// Tables published, including the closing one
    pub published: u64,
}

/// Single control thread of a sort run
pub struct Distributor<'a, O> {
    state: &'a CoordinationState,
    workers: usize,
    direction: Direction,
    observer: &'a O,

    /// Reused table buffer, sized for the pool up front
    table: Vec<Task>,

    /// Slots still waiting for tasks
    live: usize,
}

impl<'a, O: PhaseObserver> Distributor<'a, O> {
    /// Create a distributor for the pool behind `state`
    pub fn new(
        state: &'a CoordinationState,
        direction: Direction,
        observer: &'a O,
    ) -> std::result::Result<Self, AllocationError> {
        let workers = state.pool_size();
        let mut table = Vec::new();
        table
            .try_reserve_exact(workers)
            .map_err(|e| AllocationError::new("distributor table", workers, e))?;

        Ok(Self {
            state,
            workers,
            direction,
            observer,
            table,
            live: workers,
        })
    }

    /// Obtain the array from `load` and drive every phase to completion
    ///
    /// On any failure every live worker is sent `Terminate` before the error
    /// is returned, so no worker stays parked in `claim`.
    pub fn run<F>(mut self, load: F) -> Result<DistributionReport>
    where
        F: FnOnce() -> Result<Vec<i32>>,
    {
        let loaded = load().and_then(|v| {
            validate_layout(v.len(), self.workers)?;
            Ok(v)
        });
        let values = match loaded {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "Array unavailable, releasing workers");
                self.abort();
                return Err(e);
            }
        };

        let size = values.len();
        self.state.install_array(values);

        match self.distribute(size) {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!(error = %e, "Distribution failed, releasing workers");
                self.abort();
                Err(e)
            }
        }
    }

    fn distribute(&mut self, size: usize) -> Result<DistributionReport> {
        let mut plan = PhasePlan::new(size, self.workers, self.direction);
        let total = plan.work_phases();
        let mut report = DistributionReport {
            size,
            phases: Vec::with_capacity(total),
            published: 0,
        };

        info!(
            size,
            workers = self.workers,
            direction = %self.direction,
            phases = total,
            "Distributing sort"
        );

        while let Some(step) = plan.fill_next(&mut self.table) {
            let started = Instant::now();
            let phase = self.publish()?;
            report.published += 1;

            match step {
                Step::Work { kind, width, tasks } => {
                    let info = PhaseInfo {
                        phase,
                        total,
                        kind,
                        width,
                        tasks,
                    };
                    self.observer.phase_started(&info);

                    self.state.wait_drained();
                    let elapsed = started.elapsed();
                    debug!(phase, ?kind, width, tasks, ?elapsed, "Phase done");

                    self.observer.phase_finished(&info, elapsed);
                    report.phases.push(PhaseTiming {
                        phase,
                        kind,
                        width,
                        tasks,
                        elapsed,
                    });
                }
                Step::Close => {
                    self.state.wait_drained();
                    debug!(phase, "Workers released");
                }
            }
        }

        Ok(report)
    }

    /// Publish the current table and track how many slots stay alive
    fn publish(&mut self) -> Result<u64> {
        let phase = self.state.publish(&self.table)?;
        self.live = self
            .table
            .iter()
            .filter(|t| !matches!(t, Task::Terminate))
            .count();
        Ok(phase)
    }

    /// Retire every live slot without waiting for them
    fn abort(&mut self) {
        self.table.clear();
        self.table.extend((0..self.live).map(|_| Task::Terminate));
        if let Err(e) = self.state.publish(&self.table) {
            warn!(error = %e, "Could not publish termination table");
        }
        self.live = 0;
    }
}

/// Send `Terminate` to the first `count` slots
///
/// Used by orchestration when the distributor itself could not run.
pub(crate) fn release_workers(state: &CoordinationState, count: usize) -> Result<()> {
    let table = vec![Task::Terminate; count];
    state.publish(&table)?;
    Ok(())
}
