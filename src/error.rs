//! Error types for bitonic-pool
//!
//! This module defines the error hierarchy that covers:
//! - Configuration errors (worker count, pool/array size mismatch)
//! - Input file errors (missing file, unreadable header)
//! - Format errors (array length not a power of two)
//! - Allocation failures when sizing the array or internal tables
//! - Worker/distributor thread errors
//!
//! Every error is terminal for the run. The engine returns them as typed
//! values; the binary adds context with anyhow and maps them to a nonzero
//! exit status.

use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a sort run
#[derive(Error, Debug)]
pub enum SortError {
    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input file errors
    #[error(transparent)]
    Input(#[from] InputError),

    /// Array format errors
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Allocation errors
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Worker/concurrency errors
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The final array failed the order check
    #[error("Array is not ordered: elements {index} and {} are out of order", .index + 1)]
    Unsorted { index: usize },
}

impl SortError {
    /// True if the error was raised before any thread could have started
    pub fn is_validation(&self) -> bool {
        matches!(self, SortError::Config(_) | SortError::Format(_))
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Array length not divisible by the worker count
    #[error("Array of {size} elements cannot be split evenly across {workers} workers")]
    UnevenPartition { size: usize, workers: usize },

    /// Published table does not fit the worker pool
    #[error("Task table of {len} entries exceeds the pool of {pool} workers")]
    TableTooLarge { len: usize, pool: usize },

    /// Neither an input file nor a subcommand was given
    #[error("Input file not specified (use -f <FILE>)")]
    MissingInput,
}

/// Input file errors
#[derive(Error, Debug)]
pub enum InputError {
    /// File could not be opened
    #[error("Could not open '{path}'")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header (element count) could not be read
    #[error("Could not read the size of the array from '{path}': {reason}")]
    Header { path: PathBuf, reason: String },

    /// Payload read failed
    #[error("Could not read values from '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be written
    #[error("Could not write '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Array format errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Length not a power of two
    #[error("The size of the array must be a power of 2, got {size}")]
    NotPowerOfTwo { size: usize },

    /// Negative element count in the header
    #[error("Negative array size {size} in header")]
    NegativeSize { size: i32 },
}

/// Allocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not allocate {what} for {count} elements: {reason}")]
pub struct AllocationError {
    pub what: &'static str,
    pub count: usize,
    pub reason: String,
}

impl AllocationError {
    pub fn new(what: &'static str, count: usize, err: TryReserveError) -> Self {
        Self {
            what,
            count,
            reason: err.to_string(),
        }
    }
}

/// Worker thread errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Thread could not be created
    #[error("Could not create thread {name}: {reason}")]
    SpawnFailed { name: String, reason: String },

    /// Worker panicked
    #[error("Worker {slot} panicked: {message}")]
    Panicked { slot: usize, message: String },

    /// Distributor panicked
    #[error("Distributor panicked: {message}")]
    DistributorPanicked { message: String },

    /// The array was never handed to the coordination state
    #[error("No array installed when worker {slot} claimed a task")]
    MissingArray { slot: usize },

    /// The coordination state held no array once every thread had finished
    #[error("Array was not handed back after the run")]
    ArrayNotReturned,
}

/// Result type alias for SortError
pub type Result<T> = std::result::Result<T, SortError>;

/// Result type alias for InputError
pub type InputResult<T> = std::result::Result<T, InputError>;

/// Extract a readable message from a thread panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".into()
    }
}
