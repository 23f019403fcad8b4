//! Configuration types for bitonic-pool
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::engine::{Direction, MAX_WORKERS};
use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default number of worker threads
pub const DEFAULT_WORKERS: usize = 2;

/// Multithreaded bitonic sort of binary integer arrays
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bitonic-pool",
    version,
    about = "Multithreaded bitonic sort of binary integer arrays",
    long_about = "Sorts an array of 32-bit integers read from a binary file.\n\n\
                  The file holds a native-endian i32 element count (a power of two)\n\
                  followed by the values. A distributor thread splits the array across\n\
                  the worker pool and runs the merge cascade in synchronized phases.",
    after_help = "EXAMPLES:\n    \
        bitonic-pool -f data.bin\n    \
        bitonic-pool -f data.bin -n 8 --order asc\n    \
        bitonic-pool -f data.bin --sequential\n    \
        bitonic-pool generate data.bin --count 1048576 --seed 42",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct CliArgs {
    /// Input file with numbers
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Subcommand (generate)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Number of worker threads (minimum 1)
    #[arg(short = 'n', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Target order
    #[arg(short = 'o', long, value_enum, default_value_t = Order::Desc)]
    pub order: Order,

    /// Sort on the main thread with the plain recursive kernel
    #[arg(long)]
    pub sequential: bool,

    /// Quiet mode - suppress header, progress and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a random input file
    Generate {
        /// Output file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Number of values (power of two)
        #[arg(short = 'c', long, default_value = "1024", value_name = "NUM")]
        count: usize,

        /// Seed for reproducible contents
        #[arg(short = 's', long, value_name = "SEED")]
        seed: Option<u64>,
    },
}

/// Sort order as spelled on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Smallest value first
    Asc,
    /// Largest value first
    Desc,
}

impl From<Order> for Direction {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => Direction::Ascending,
            Order::Desc => Direction::Descending,
        }
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Input file path
    pub input_path: PathBuf,

    /// Number of worker threads
    pub worker_count: usize,

    /// Target order
    pub direction: Direction,

    /// Run the single-threaded baseline instead of the pool
    pub sequential: bool,

    /// Show header, progress and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl SortConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let input_path = args.file.ok_or(ConfigError::MissingInput)?;

        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        Ok(Self {
            input_path,
            worker_count: args.workers,
            direction: args.order.into(),
            sequential: args.sequential,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}
