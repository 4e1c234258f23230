//! file-verifier - Zero-Block File Scanner
//!
//! Walks a directory tree and reads every regular file in fixed-size
//! blocks, reporting how many blocks consist entirely of binary zeroes.
//! Zero blocks in files that should hold data are a common symptom of
//! silent corruption after a failed copy or a storage fault.
//!
//! # Features
//!
//! - **Cheap Probing**: Each block is probed with one small chunk. Only
//!   blocks whose probe is all zero are read in full.
//!
//! - **Parallel Scanning**: A fixed pool of worker threads, each with its
//!   own reusable read buffers.
//!
//! - **Backpressure**: Job and results queues are bounded by the worker
//!   count, so memory stays flat on trees of any size.
//!
//! - **CSV Output**: One line per file on stdout, optionally appended to a
//!   log file.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Directory tree                              │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ walkdir
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            ┌──────────────────────────┐                         │
//! │            │       Job Queue          │                         │
//! │            │  (crossbeam bounded)     │                         │
//! │            └──────────────────────────┘                         │
//! │                         │                                       │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       └────────────┼────────────┼────────────────────┘          │
//! │                    ▼            ▼                               │
//! │     ┌──────────────────┐   ┌──────────────────┐                 │
//! │     │  Results Queue   │   │ Progress stream  │                 │
//! │     └────────┬─────────┘   └────────┬─────────┘                 │
//! │              ▼                      ▼                           │
//! │     ┌──────────────────┐   ┌──────────────────┐                 │
//! │     │  Result logger   │   │   Rate monitor   │                 │
//! │     └────────┬─────────┘   └──────────────────┘                 │
//! └──────────────┼──────────────────────────────────────────────────┘
//!                ▼
//!        stdout + log file
//! ```
//!
//! # Example
//!
//! ```bash
//! # Scan the current directory with 10 workers
//! file-verifier
//!
//! # Scan a mount with 32 workers and keep a log
//! file-verifier -p /mnt/restore --parallel 32 -w verify.log
//!
//! # Find affected files
//! grep -v 'Read whole file' verify.log
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod progress;
pub mod report;
pub mod types;
pub mod walker;

pub use config::{CliArgs, ScanConfig};
pub use content::{BlockGeometry, ZeroBlockScanner};
pub use error::{Result, ScanError};
pub use types::{FileJob, ScanOutcome, ScanResult};
pub use walker::{ScanCoordinator, ScanSummary};
