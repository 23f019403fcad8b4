//! Progress reporting for the sort
//!
//! Provides a phase progress bar using indicatif and the start/end banners.

use crate::engine::{PhaseInfo, PhaseKind, PhaseObserver, SortReport};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Number of values shown at each end of a large array
const PREVIEW: usize = 16;

/// Progress reporter that advances once per completed phase
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} phases {msg}")
                .expect("Invalid progress template")
                .progress_chars("=> ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseObserver for ProgressReporter {
    fn phase_started(&self, info: &PhaseInfo) {
        self.bar.set_length(info.total as u64);
        self.bar.set_message(phase_label(info));
    }

    fn phase_finished(&self, _info: &PhaseInfo, _elapsed: Duration) {
        self.bar.inc(1);
    }
}

fn phase_label(info: &PhaseInfo) -> String {
    let kind = match info.kind {
        PhaseKind::Sort => "sort",
        PhaseKind::Merge => "merge",
    };
    format!(
        "{} width {} ({} tasks)",
        kind,
        format_number(info.width as u64),
        info.tasks
    )
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// The whole array when small, otherwise the first and last values
fn preview(values: &[i32]) -> Vec<String> {
    let join = |vals: &[i32]| {
        vals.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    };

    if values.len() <= PREVIEW * 2 {
        vec![join(values)]
    } else {
        vec![
            format!("first {}: {}", PREVIEW, join(&values[..PREVIEW])),
            format!("last {}: {}", PREVIEW, join(&values[values.len() - PREVIEW..])),
        ]
    }
}

/// Print a header at the start of the sort
pub fn print_header(input: &str, elements: usize, workers: usize, mode: &str) {
    let bytes = (elements * std::mem::size_of::<i32>()) as u64;

    println!();
    println!(
        "{} {}",
        style("bitonic-pool").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Input:").bold(), input);
    println!(
        "  {} {} ({})",
        style("Elements:").bold(),
        format_number(elements as u64),
        format_size(bytes, BINARY)
    );
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Mode:").bold(), mode);
    println!();
}

/// Print a summary of the sort results
pub fn print_summary(report: &SortReport) {
    println!();
    println!("{}", style("Sort Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Elements:").bold(),
        format_number(report.values.len() as u64)
    );
    println!("  {} {}", style("Order:").bold(), report.direction);
    println!(
        "  {} {} ({} sorts, {} merges)",
        style("Phases:").bold(),
        report.phase_count(),
        report.pool.sorts,
        report.pool.merges
    );
    for phase in &report.phases {
        println!(
            "    {:?} width {:>12}: {:.3}ms",
            phase.kind,
            format_number(phase.width as u64),
            phase.elapsed.as_secs_f64() * 1000.0
        );
    }
    println!(
        "  {} {:.3}s ({:.0} elements/sec)",
        style("Duration:").bold(),
        report.duration.as_secs_f64(),
        report.elements_per_second()
    );
    println!("  {} {}", style("Verdict:").bold(), style("ordered").green());
    for line in preview(&report.values) {
        println!("    {}", line);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1048576), "1,048,576");
    }

    #[test]
    fn test_preview_small_and_large() {
        assert_eq!(preview(&[3, 2, 1]), vec!["3 2 1".to_string()]);

        let values: Vec<i32> = (0..64).collect();
        let lines = preview(&values);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("first 16: 0 1 2"));
        assert!(lines[1].ends_with("62 63"));
    }

    #[test]
    fn test_phase_label() {
        let info = PhaseInfo {
            phase: 2,
            total: 3,
            kind: PhaseKind::Merge,
            width: 4096,
            tasks: 2,
        };
        assert_eq!(phase_label(&info), "merge width 4,096 (2 tasks)");
    }
}
