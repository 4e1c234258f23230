//! Error types for file-verifier
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Per-file errors (open/stat), which become failed scan results
//! - Scanner faults (I/O mid-scan, read cursor misalignment)
//! - Worker thread errors
//!
//! Per-file errors never unwind the pipeline. They travel through the
//! results queue like any other result. Only a misaligned read cursor is
//! fatal for the whole scan.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the file-verifier application
#[derive(Error, Debug)]
pub enum ScanError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (log file, stdout)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A consumer thread (result logger, rate monitor) panicked
    #[error("{0} thread panicked")]
    ConsumerPanicked(&'static str),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Chunk/block sizes that cannot be scanned on chunk boundaries
    #[error("Invalid block geometry (chunk {chunk}, block {block}): {reason}")]
    InvalidGeometry {
        chunk: u64,
        block: u64,
        reason: String,
    },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Scan root does not exist
    #[error("Scan root '{path}' does not exist")]
    MissingRoot { path: PathBuf },

    /// Log file path error
    #[error("Invalid log path '{path}': {reason}")]
    InvalidLogPath { path: PathBuf, reason: String },
}

/// Errors acquiring a file for scanning
#[derive(Error, Debug)]
pub enum FileError {
    /// File could not be opened read-only
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File metadata could not be read
    #[error("failed to stat '{path}': {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Faults raised by the zero-block scanner
#[derive(Error, Debug)]
pub enum ScanFault {
    /// Read cursor left a chunk boundary before end of stream
    #[error("read cursor at offset {offset} is not on a {chunk}-byte chunk boundary")]
    Misaligned { offset: u64, chunk: u64 },

    /// Read or seek failed mid-scan
    #[error("read failed at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ScanFault {
    /// Check if this fault must abort the whole scan
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanFault::Misaligned { .. })
    }
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker initialization failed
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Scanner bookkeeping invariant violated
    #[error("Worker {id} aborted scanning '{path}': {fault}")]
    Misaligned {
        id: usize,
        path: PathBuf,
        fault: ScanFault,
    },
}

/// Result type alias for ScanError
pub type Result<T> = std::result::Result<T, ScanError>;
