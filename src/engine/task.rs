//! Task and direction types exchanged between the distributor and workers

use std::fmt;
use std::ops::Range;

/// Target order of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest value first
    Ascending,

    /// Largest value first
    #[default]
    Descending,
}

impl Direction {
    /// The opposite order
    pub fn reverse(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    /// Sub-direction for the partition at `index`
    ///
    /// Even partitions keep the requested order, odd ones reverse it, so each
    /// adjacent pair of partitions forms a bitonic sequence for the next merge.
    pub fn for_partition(self, index: usize) -> Self {
        if index % 2 == 0 {
            self
        } else {
            self.reverse()
        }
    }

    /// True if `a` must not precede `b` in this order
    #[inline]
    pub fn out_of_order(self, a: i32, b: i32) -> bool {
        match self {
            Direction::Ascending => a > b,
            Direction::Descending => a < b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work bound to a worker slot for a single phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Fully sort `count` elements starting at `start`
    Sort {
        start: usize,
        count: usize,
        direction: Direction,
    },

    /// Merge the bitonic range of `count` elements starting at `start`
    Merge {
        start: usize,
        count: usize,
        direction: Direction,
    },

    /// Retire the worker permanently
    Terminate,

    /// No assignment for this slot in the current phase
    Idle,
}

impl Task {
    /// Index range touched by this task, if any
    pub fn range(&self) -> Option<Range<usize>> {
        match *self {
            Task::Sort { start, count, .. } | Task::Merge { start, count, .. } => {
                Some(start..start + count)
            }
            Task::Terminate | Task::Idle => None,
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Sort { .. } => "sort",
            Task::Merge { .. } => "merge",
            Task::Terminate => "terminate",
            Task::Idle => "idle",
        }
    }
}

/// What a worker receives from a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// Phase number the task belongs to (0-based, counts every publish)
    pub phase: u64,

    /// The task bound to the claiming slot
    pub task: Task,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_direction_alternates() {
        let d = Direction::Descending;
        assert_eq!(d.for_partition(0), Direction::Descending);
        assert_eq!(d.for_partition(1), Direction::Ascending);
        assert_eq!(d.for_partition(2), Direction::Descending);

        let a = Direction::Ascending;
        assert_eq!(a.for_partition(0), Direction::Ascending);
        assert_eq!(a.for_partition(3), Direction::Descending);
    }

    #[test]
    fn test_out_of_order() {
        assert!(Direction::Ascending.out_of_order(3, 1));
        assert!(!Direction::Ascending.out_of_order(1, 3));
        assert!(!Direction::Ascending.out_of_order(2, 2));
        assert!(Direction::Descending.out_of_order(1, 3));
        assert!(!Direction::Descending.out_of_order(2, 2));
    }

    #[test]
    fn test_task_range() {
        let task = Task::Merge {
            start: 8,
            count: 4,
            direction: Direction::Ascending,
        };
        assert_eq!(task.range(), Some(8..12));
        assert_eq!(Task::Terminate.range(), None);
        assert_eq!(Task::Idle.kind(), "idle");
    }
}
