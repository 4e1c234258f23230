//! Shared pipeline control flags
//!
//! Two one-way switches, both lock-free:
//! - `stop_feeding`: the walker stops queueing new jobs; queued jobs are
//!   still scanned and logged.
//! - `halt`: workers stop pulling jobs as well. Set on fatal faults.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Control state shared by the walker, workers and coordinator
#[derive(Debug, Default)]
pub struct PipelineControl {
    stop_feeding: AtomicBool,
    halt: AtomicBool,
    file_errors: AtomicU64,
    max_errors: Option<u64>,
}

impl PipelineControl {
    /// Create control state with an optional per-file error budget
    pub fn new(max_errors: Option<u64>) -> Self {
        Self {
            max_errors,
            ..Self::default()
        }
    }

    /// Record a failed file
    ///
    /// Returns true if this failure exhausted the error budget.
    pub fn record_file_error(&self) -> bool {
        let errors = self.file_errors.fetch_add(1, Ordering::SeqCst) + 1;
        match self.max_errors {
            Some(max) if errors >= max => !self.stop_feeding.swap(true, Ordering::SeqCst),
            _ => false,
        }
    }

    /// Failed files recorded so far
    pub fn file_errors(&self) -> u64 {
        self.file_errors.load(Ordering::SeqCst)
    }

    /// Stop the pipeline after a fatal fault
    pub fn halt(&self) {
        self.stop_feeding.store(true, Ordering::SeqCst);
        self.halt.store(true, Ordering::SeqCst);
    }

    /// Check if the walker should stop queueing jobs
    pub fn should_stop_feeding(&self) -> bool {
        self.stop_feeding.load(Ordering::SeqCst)
    }

    /// Check if workers should stop pulling jobs
    pub fn is_halted(&self) -> bool {
        self.halt.load(Ordering::SeqCst)
    }
}
