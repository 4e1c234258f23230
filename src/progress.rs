//! Throughput reporting for the scan
//!
//! Provides the rate monitor (chunks handled per interval) plus the
//! header and summary printed around a scan.

use crate::config::ScanConfig;
use crate::walker::ScanSummary;
use console::style;
use crossbeam_channel::{select, tick, Receiver};
use humansize::{format_size, BINARY};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Reporting window for the rate monitor
pub const RATE_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the rate monitor thread
///
/// The thread exits once every progress sender has been dropped and
/// returns the total number of signals it counted.
pub fn spawn_rate_monitor<F>(
    signals: Receiver<()>,
    interval: Duration,
    report: F,
) -> io::Result<JoinHandle<u64>>
where
    F: FnMut(u64) + Send + 'static,
{
    thread::Builder::new()
        .name("rate-monitor".into())
        .spawn(move || run_rate_monitor(signals, interval, report))
}

/// Count progress signals, calling `report` with the count once per interval
pub fn run_rate_monitor<F>(signals: Receiver<()>, interval: Duration, mut report: F) -> u64
where
    F: FnMut(u64),
{
    let ticker = tick(interval);
    let mut counter = 0u64;
    let mut total = 0u64;

    loop {
        select! {
            recv(signals) -> msg => match msg {
                Ok(()) => {
                    counter += 1;
                    total += 1;
                }
                Err(_) => break,
            },
            recv(ticker) -> _ => {
                report(counter);
                counter = 0;
            }
        }
    }

    debug!(chunks = total, unreported = counter, "Rate monitor stopped");
    total
}

/// Default reporter: one log line per interval
pub fn log_rate(chunks: u64, interval: Duration) {
    info!("{}", rate_message(chunks, interval));
}

fn rate_message(chunks: u64, interval: Duration) -> String {
    if interval == RATE_INTERVAL {
        format!("Handled {} chunks last second", format_number(chunks))
    } else {
        format!("Handled {} chunks in the last {:?}", format_number(chunks), interval)
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

/// Print a header at the start of the scan
pub fn print_header(config: &ScanConfig) {
    eprintln!();
    eprintln!(
        "{} {}",
        style("file-verifier").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Root:").bold(), config.root.display());
    eprintln!("  {} {}", style("Workers:").bold(), config.worker_count);
    eprintln!(
        "  {} {} chunk / {} block",
        style("Geometry:").bold(),
        format_size(config.geometry.chunk(), BINARY),
        format_size(config.geometry.block(), BINARY)
    );
    if let Some(log) = &config.log_path {
        eprintln!("  {} {}", style("Log file:").bold(), log.display());
    }
    eprintln!();
}

/// Print a summary of the scan results
pub fn print_summary(summary: &ScanSummary, log_path: Option<&std::path::Path>) {
    let duration_secs = summary.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        summary.bytes_read as f64 / duration_secs
    } else {
        0.0
    };

    eprintln!();
    if summary.completed {
        eprintln!("{}", style("Scan Complete").green().bold());
    } else {
        eprintln!("{}", style("Scan Stopped Early").yellow().bold());
    }
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}",
        style("Started:").bold(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    eprintln!(
        "  {} {}",
        style("Files:").bold(),
        format_number(summary.files_logged)
    );
    eprintln!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(summary.bytes, BINARY)
    );
    eprintln!(
        "  {} {:.1}s ({}/s read)",
        style("Duration:").bold(),
        duration_secs,
        format_size(rate as u64, BINARY)
    );
    eprintln!(
        "  {} {}",
        style("Chunks:").bold(),
        format_number(summary.chunks)
    );

    if summary.zero_blocks > 0 {
        eprintln!(
            "  {} {} in {} files",
            style("Zero blocks:").red().bold(),
            format_number(summary.zero_blocks),
            format_number(summary.files_with_zero_blocks)
        );
    } else {
        eprintln!("  {} none", style("Zero blocks:").bold());
    }

    if summary.failed_files > 0 || summary.walk_errors > 0 {
        eprintln!(
            "  {} {} files failed, {} walk errors",
            style("Errors:").yellow().bold(),
            format_number(summary.failed_files),
            format_number(summary.walk_errors)
        );
    }

    if let Some(path) = log_path {
        if summary.log_file_failed {
            eprintln!(
                "  {} {} {}",
                style("Log file:").bold(),
                path.display(),
                style("(write failed)").red()
            );
        } else {
            eprintln!("  {} {}", style("Log file:").bold(), path.display());
        }
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_rate_message_names_interval() {
        assert_eq!(
            rate_message(1500, RATE_INTERVAL),
            "Handled 1,500 chunks last second"
        );
        assert_eq!(
            rate_message(7, Duration::from_millis(250)),
            "Handled 7 chunks in the last 250ms"
        );
    }

    #[test]
    fn test_monitor_counts_every_signal() {
        let (tx, rx) = unbounded();
        for _ in 0..100 {
            tx.send(()).unwrap();
        }
        drop(tx);

        let mut reports = Vec::new();
        let total = run_rate_monitor(rx, Duration::from_secs(3600), |n| reports.push(n));
        assert_eq!(total, 100);
        assert!(reports.is_empty());
    }

    #[test]
    fn test_monitor_reports_per_interval() {
        let (tx, rx) = unbounded();
        let (report_tx, report_rx) = unbounded();

        let monitor = spawn_rate_monitor(rx, Duration::from_millis(10), move |n| {
            let _ = report_tx.send(n);
        })
        .unwrap();

        for _ in 0..5 {
            tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(25));
        }
        drop(tx);

        let total = monitor.join().unwrap();
        let reports: Vec<u64> = report_rx.try_iter().collect();

        assert_eq!(total, 5);
        assert!(!reports.is_empty());
        assert!(reports.iter().sum::<u64>() <= total);
    }

    #[test]
    fn test_monitor_stops_on_disconnect() {
        let (tx, rx) = unbounded::<()>();
        let monitor = spawn_rate_monitor(rx, Duration::from_millis(5), |_| {}).unwrap();
        drop(tx);
        assert_eq!(monitor.join().unwrap(), 0);
    }
}
