//! bitonic-pool - Phase-Synchronized Multithreaded Bitonic Sort
//!
//! Sorts a power-of-two sized array of 32-bit integers with a fixed pool of
//! worker threads driven by a single distributor thread.
//!
//! # Features
//!
//! - **Explicit coordination state**: one table of per-slot tasks and
//!   completion flags behind a mutex; the only operations are publish, claim
//!   and complete.
//!
//! - **Shrinking participation**: the merge cascade halves the number of
//!   tasks per level and retires surplus workers with `Terminate`.
//!
//! - **Strict phase ordering**: a phase is published only after every task
//!   of the previous one has completed.
//!
//! - **Safe failure**: when the array cannot be obtained, every worker is
//!   released before the error is reported.
//!
//! # Example
//!
//! ```
//! use bitonic_pool::engine::{Direction, SortEngine};
//!
//! let engine = SortEngine::new(2, Direction::Descending).unwrap();
//! let report = engine.sort(vec![5, 3, 8, 1, 9, 2, 7, 4]).unwrap();
//! assert_eq!(report.values, vec![9, 8, 7, 5, 4, 3, 2, 1]);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod progress;
