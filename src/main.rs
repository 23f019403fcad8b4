//! bitonic-pool - Phase-Synchronized Multithreaded Bitonic Sort
//!
//! Entry point for the CLI application.

use anyhow::{bail, Context, Result};
use bitonic_pool::config::{CliArgs, Command, SortConfig};
use bitonic_pool::engine::{sort_sequential, NoopObserver, SortEngine};
use bitonic_pool::input::{random_values, write_array, InputFile};
use bitonic_pool::progress::{print_header, print_summary, ProgressReporter};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    if let Some(Command::Generate {
        output,
        count,
        seed,
    }) = &args.command
    {
        return generate(output, *count, *seed);
    }

    // Validate and create config
    let config = SortConfig::from_args(args).context("Invalid configuration")?;

    // Header is validated before any thread starts
    let input = InputFile::open(&config.input_path)
        .with_context(|| format!("Failed to open {}", config.input_path.display()))?;

    if config.show_progress {
        let mode = if config.sequential {
            "sequential".to_string()
        } else {
            format!("{} threads, {}", config.worker_count, config.direction)
        };
        print_header(
            &config.input_path.display().to_string(),
            input.len(),
            config.worker_count,
            &mode,
        );
    }

    if config.sequential {
        run_sequential(&config, input)
    } else {
        run_pool(&config, input)
    }
}

/// Sort on the main thread with the kernel alone
fn run_sequential(config: &SortConfig, input: InputFile) -> Result<()> {
    let values = input.read_values().context("Failed to load array")?;
    let report = sort_sequential(values, config.direction).context("Sort failed")?;

    info!(
        size = report.values.len(),
        duration_ms = report.duration.as_millis() as u64,
        "Sequential sort done"
    );

    if config.show_progress {
        print_summary(&report);
    }
    Ok(())
}

/// Sort with the distributor and the worker pool
fn run_pool(config: &SortConfig, input: InputFile) -> Result<()> {
    let engine = SortEngine::from_config(config);

    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    if let Some(ref p) = progress {
        p.set_status("Loading array...");
    }

    // Layout is checked here; the payload is read on the distributor thread
    let result = match progress {
        Some(ref p) => engine.sort_input(input, p),
        None => engine.sort_input(input, &NoopObserver),
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish_and_clear();
            }
            return Err(e).context("Sort failed");
        }
    };

    if let Some(ref p) = progress {
        p.finish("Sort completed");
    }

    if config.show_progress {
        print_summary(&report);
    } else {
        info!(
            size = report.values.len(),
            phases = report.phase_count(),
            "Array is ordered"
        );
    }

    Ok(())
}

/// Write a random input file
fn generate(output: &Path, count: usize, seed: Option<u64>) -> Result<()> {
    if !count.is_power_of_two() {
        bail!("count must be a power of 2, got {}", count);
    }

    let values = random_values(count, seed);
    write_array(output, &values)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(path = %output.display(), count, "Input file written");
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("bitonic_pool=debug,warn")
    } else {
        EnvFilter::new("bitonic_pool=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(verbose)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
