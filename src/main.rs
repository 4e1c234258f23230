//! file-verifier - Zero-Block File Scanner
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use file_verifier::config::{normalize_legacy_args, CliArgs, ScanConfig};
use file_verifier::progress::{print_header, print_summary};
use file_verifier::walker::ScanCoordinator;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the scan covered the whole tree
fn run() -> Result<bool> {
    // Parse CLI arguments
    let args = CliArgs::parse_from(normalize_legacy_args(std::env::args_os()));

    if args.version {
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = ScanConfig::from_args(args).context("Invalid configuration")?;
    let show_progress = config.show_progress;
    let log_path = config.log_path.clone();

    if show_progress {
        print_header(&config);
    }

    let summary = ScanCoordinator::new(config).run().context("Scan failed")?;

    if show_progress {
        print_summary(&summary, log_path.as_deref());
    }

    if !summary.completed {
        info!(
            failed = summary.failed_files,
            "Scan stopped early after reaching the error limit"
        );
    }

    Ok(summary.completed)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("file_verifier=debug,warn")
    } else {
        EnvFilter::new("file_verifier=info,warn")
    };

    // Stdout carries the result lines only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
