//! Per-file result reporting
//!
//! The result logger is the only consumer of the results queue. It owns
//! stdout for CSV lines and the optional append-mode log file.

pub mod logger;

pub use logger::{format_line, open_log_file, spawn_logger, status, LogSummary, ResultLogger};
