//! Coordination state shared by the distributor and the worker pool
//!
//! One mutex guards the task table and the completion flags. Two condition
//! variables gate the two sides:
//!
//! - `tasks_ready`: workers wait here until a phase is open and their slot
//!   has not completed yet
//! - `tasks_done`: the distributor waits here until every active slot of
//!   the open phase has completed
//!
//! ```text
//!   Distributor                  CoordinationState                 Worker[slot]
//!   ───────────                  ─────────────────                 ────────────
//!   publish(tasks) ──────► wait phase closed
//!                          install tasks, active = len
//!                          reset ALL flags, open phase ──────────► claim(slot)
//!                                                                  run task
//!                          flag[slot] = true ◄──────────────────── complete(slot)
//!                          last active slot? close phase
//!   publish(next)  ◄────── wake distributor
//! ```
//!
//! Slots at or beyond `active_count` claim `Task::Idle`.

use super::shared::SharedArray;
use super::task::{Assignment, Task};
use crate::error::{AllocationError, ConfigError};
use parking_lot::{Condvar, Mutex};
use std::sync::OnceLock;
use tracing::{debug, trace, warn};

/// Table and flags guarded by the coordination mutex
#[derive(Debug)]
struct Table {
    /// Tasks of the current phase; `tasks.len()` is the active count
    tasks: Vec<Task>,

    /// Completion flag per pool slot
    done: Vec<bool>,

    /// Active slots completed in the current phase
    done_count: usize,

    /// Number of the current phase
    phase: u64,

    /// Number of tables published so far
    published: u64,

    /// True between publish and the last active completion
    open: bool,
}

/// Shared state for one sort run
#[derive(Debug)]
pub struct CoordinationState {
    /// Fixed number of worker slots
    pool_size: usize,

    table: Mutex<Table>,

    tasks_ready: Condvar,

    tasks_done: Condvar,

    /// Array handle, installed once by the distributor
    array: OnceLock<SharedArray>,
}

impl CoordinationState {
    /// Create the state for a pool of `pool_size` workers
    pub fn new(pool_size: usize) -> Result<Self, AllocationError> {
        let mut tasks = Vec::new();
        tasks
            .try_reserve_exact(pool_size)
            .map_err(|e| AllocationError::new("task table", pool_size, e))?;

        let mut done = Vec::new();
        done.try_reserve_exact(pool_size)
            .map_err(|e| AllocationError::new("completion flags", pool_size, e))?;
        done.resize(pool_size, false);

        Ok(Self {
            pool_size,
            table: Mutex::new(Table {
                tasks,
                done,
                done_count: 0,
                phase: 0,
                published: 0,
                open: false,
            }),
            tasks_ready: Condvar::new(),
            tasks_done: Condvar::new(),
            array: OnceLock::new(),
        })
    }

    /// Number of worker slots
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Publish the task table of the next phase
    ///
    /// Blocks until the previous phase has drained, then installs `tasks`
    /// for slots `0..tasks.len()`, clears the completion flag of every
    /// slot and wakes all waiting workers. Returns the new phase number.
    pub fn publish(&self, tasks: &[Task]) -> Result<u64, ConfigError> {
        if tasks.len() > self.pool_size {
            return Err(ConfigError::TableTooLarge {
                len: tasks.len(),
                pool: self.pool_size,
            });
        }
        debug_assert!(!tasks.contains(&Task::Idle), "idle is implied, never published");

        let mut table = self.table.lock();
        while table.open {
            self.tasks_done.wait(&mut table);
        }

        table.tasks.clear();
        table.tasks.extend_from_slice(tasks);
        // Every slot, not just the active ones: a slot retired by a smaller
        // table must not keep a stale flag from a larger one.
        table.done.fill(false);
        table.done_count = 0;
        table.phase = table.published;
        table.published += 1;
        table.open = !tasks.is_empty();

        let phase = table.phase;
        debug!(phase, active = tasks.len(), "Phase published");

        self.tasks_ready.notify_all();
        Ok(phase)
    }

    /// Wait for the task bound to `slot` in the open phase
    ///
    /// Returns `Task::Idle` when `slot` has no entry in the current table.
    pub fn claim(&self, slot: usize) -> Assignment {
        let mut table = self.table.lock();
        while !table.open || table.done[slot] {
            self.tasks_ready.wait(&mut table);
        }

        let task = table.tasks.get(slot).copied().unwrap_or(Task::Idle);
        trace!(slot, phase = table.phase, task = task.kind(), "Task claimed");

        Assignment {
            phase: table.phase,
            task,
        }
    }

    /// Mark the current task of `slot` as finished
    ///
    /// The last active slot to finish closes the phase and wakes the
    /// distributor. Never blocks on anything but the mutex.
    pub fn complete(&self, slot: usize) {
        let mut table = self.table.lock();
        if table.done[slot] {
            return;
        }
        table.done[slot] = true;

        if slot < table.tasks.len() {
            table.done_count += 1;
            if table.done_count == table.tasks.len() {
                table.open = false;
                trace!(phase = table.phase, "Phase drained");
                self.tasks_done.notify_all();
            }
        }
    }

    /// Block until the open phase, if any, has drained
    pub fn wait_drained(&self) {
        let mut table = self.table.lock();
        while table.open {
            self.tasks_done.wait(&mut table);
        }
    }

    /// Number of tables published so far
    pub fn phases_published(&self) -> u64 {
        self.table.lock().published
    }

    /// Hand the array to the workers
    pub fn install_array(&self, values: Vec<i32>) {
        if self.array.set(SharedArray::new(values)).is_err() {
            warn!("Array already installed, keeping the first one");
        }
    }

    pub(crate) fn array(&self) -> Option<&SharedArray> {
        self.array.get()
    }

    /// Take the array back once every thread has finished
    pub fn into_array(self) -> Option<Vec<i32>> {
        self.array.into_inner().map(SharedArray::into_vec)
    }
}
