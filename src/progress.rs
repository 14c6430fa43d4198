//! Progress and summary output
//!
//! A spinner while the run is in flight, a styled banner before it, and a
//! summary afterwards. All of it is suppressed by quiet mode except the
//! summary, which is always printed on any completed run.

use crate::config::RunConfig;
use crate::engine::RunReport;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a run is in flight
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the run
pub fn print_header(config: &RunConfig) {
    println!();
    println!(
        "{} {}",
        style("fastmod").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Path:").bold(), config.path.display());
    println!("  {} {}", style("File perms:").bold(), config.file_perms);
    println!("  {} {}", style("Dir perms:").bold(), config.dir_perms);
    if let Some(group) = &config.group {
        println!("  {} {}", style("Group:").bold(), group);
    }
    println!(
        "  {} {}   {} {}",
        style("Workers:").bold(),
        config.worker_count,
        style("Block size:").bold(),
        config.block_size
    );
    println!();
}

/// Print a summary of the run results
pub fn print_summary(report: &RunReport) {
    let duration_secs = report.duration.as_secs_f64();

    println!();
    if report.has_failures() {
        println!("{}", style("Run Complete (with failures)").yellow().bold());
    } else {
        println!("{}", style("Run Complete").green().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Entries:").bold(),
        format_number(report.total_tasks)
    );
    println!(
        "  {} {}",
        style("Batches:").bold(),
        format_number(report.batches_flushed)
    );
    println!(
        "  {} {:.3}s ({:.1} entries/s; {:.5} s/entry)",
        style("Duration:").bold(),
        duration_secs,
        report.tasks_per_second(),
        report.seconds_per_task()
    );
    if report.batches_failed > 0 {
        println!(
            "  {} {}",
            style("Failed batches:").yellow().bold(),
            format_number(report.batches_failed)
        );
    }
    if report.skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped entries:").yellow().bold(),
            format_number(report.skipped)
        );
    }
    println!();
}
