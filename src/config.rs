//! Configuration types for file-verifier
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Normalization of the legacy single-dash `-parallel` flag
//! - Runtime configuration with validation

use crate::content::{BlockGeometry, DEFAULT_BLOCK_SIZE, DEFAULT_CHUNK_SIZE};
use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::ffi::OsString;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Default number of parallel readers
pub const DEFAULT_PARALLELISM: usize = 10;

/// Scan a directory tree for files containing blocks of binary zeroes
#[derive(Parser, Debug, Clone)]
#[command(
    name = "file-verifier",
    about = "Scan a directory tree for files containing blocks of binary zeroes",
    long_about = "Walks a directory tree and reads every regular file, looking for\n\
                  block-aligned runs of binary zeroes (a sign of truncation or failed media).\n\n\
                  One CSV line is written per file: path,size,size,status",
    after_help = "EXAMPLES:\n    \
        file-verifier -p /srv/archive\n    \
        file-verifier -p /mnt/backup -parallel 32 -w verify.log\n    \
        file-verifier -p /data --exclude '\\.snapshot' --max-errors 100",
    disable_version_flag = true
)]
pub struct CliArgs {
    /// Print the version number
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Path to walk
    #[arg(short = 'p', long = "path", default_value = "./", value_name = "PATH")]
    pub path: PathBuf,

    /// Number of parallel reads to do
    #[arg(long, default_value_t = DEFAULT_PARALLELISM, value_name = "NUM")]
    pub parallel: usize,

    /// Logfile to append results to
    #[arg(short = 'w', long = "log", value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Probe chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_name = "BYTES")]
    pub chunk_size: u64,

    /// Zero-block size in bytes (must be a multiple of the chunk size)
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, value_name = "BYTES")]
    pub block_size: u64,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_links: bool,

    /// Stop queueing files after this many files fail to open or read
    #[arg(long, value_name = "NUM")]
    pub max_errors: Option<u64>,

    /// Quiet mode - suppress header and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(long)]
    pub verbose: bool,
}

/// Rewrite legacy single-dash long flags into their clap form
///
/// `-parallel 8` and `-parallel=8` become `--parallel 8` and `--parallel=8`.
/// Everything else passes through untouched.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some("-parallel") => OsString::from("--parallel"),
            Some(s) if s.starts_with("-parallel=") => OsString::from(format!("-{}", s)),
            _ => arg,
        })
        .collect()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root of the tree to scan
    pub root: PathBuf,

    /// Number of worker threads (also the capacity of every queue)
    pub worker_count: usize,

    /// Optional append-mode log file
    pub log_path: Option<PathBuf>,

    /// Chunk/block sizes for the zero scan
    pub geometry: BlockGeometry,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Follow symlinks during traversal
    pub follow_links: bool,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Per-file error budget before feeding stops
    pub max_errors: Option<u64>,

    /// Show header and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl ScanConfig {
    /// Default configuration for scanning `root`
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            worker_count: DEFAULT_PARALLELISM,
            log_path: None,
            geometry: BlockGeometry::default(),
            max_depth: None,
            follow_links: false,
            exclude_patterns: Vec::new(),
            max_errors: None,
            show_progress: false,
            verbose: false,
        }
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Validate worker count
        if args.parallel == 0 || args.parallel > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.parallel,
                max: MAX_WORKERS,
            });
        }

        let geometry = BlockGeometry::new(args.chunk_size, args.block_size)?;

        if !args.path.exists() {
            return Err(ConfigError::MissingRoot { path: args.path });
        }

        // Compile exclude patterns
        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Validate log path
        if let Some(log) = &args.log {
            if log.is_dir() {
                return Err(ConfigError::InvalidLogPath {
                    path: log.clone(),
                    reason: "Path is a directory".to_string(),
                });
            }
            if let Some(parent) = log.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(ConfigError::InvalidLogPath {
                        path: log.clone(),
                        reason: format!("Parent directory '{}' does not exist", parent.display()),
                    });
                }
            }
        }

        Ok(Self {
            root: args.path,
            worker_count: args.parallel,
            log_path: args.log,
            geometry,
            max_depth: args.max_depth,
            follow_links: args.follow_links,
            exclude_patterns,
            max_errors: args.max_errors,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(path))
    }
}
