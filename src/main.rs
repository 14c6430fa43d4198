//! fastmod - Multithreaded utility for recursively changing permissions
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use fastmod::applier::ChmodApplier;
use fastmod::config::{CliArgs, RunConfig};
use fastmod::engine::Coordinator;
use fastmod::progress::{print_header, print_summary, ProgressReporter};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fastmod: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.quiet, args.verbose);

    let config = RunConfig::from_args(args).context("invalid configuration")?;

    if !config.quiet {
        print_header(&config);
    }

    let progress = (!config.quiet).then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Applying permissions...");
    }

    let applier = Arc::new(ChmodApplier::new(config.quiet));
    let coordinator = Coordinator::new(config, applier);
    let result = coordinator.run();

    if let Some(ref p) = progress {
        p.finish_and_clear();
    }

    // Fatal errors skip the report; a completed run always prints one
    let report = result.context("run failed")?;
    print_summary(&report);

    Ok(())
}

fn setup_logging(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("fastmod=warn")
    } else if verbose {
        EnvFilter::new("fastmod=debug,warn")
    } else {
        EnvFilter::new("fastmod=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
