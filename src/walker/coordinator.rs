//! Scan coordinator - orchestrates the parallel scan pipeline
//!
//! The coordinator is responsible for:
//! - Creating the job queue, results queue and progress stream
//! - Starting the result logger, rate monitor and worker threads
//! - Driving the directory walk on the calling thread
//! - The drain-then-close shutdown sequence
//! - Final statistics
//!
//! Shutdown order matters. The job queue closes when the walk ends. Workers
//! exit once it is drained, and their exit closes the results queue and
//! progress stream. The logger and monitor then drain what is left and exit.

use crate::config::ScanConfig;
use crate::content::ZeroBlockScanner;
use crate::error::{Result, ScanError, WorkerError};
use crate::progress::{log_rate, spawn_rate_monitor, RATE_INTERVAL};
use crate::report::spawn_logger;
use crate::types::{FileJob, ScanResult};
use crate::walker::control::PipelineControl;
use crate::walker::queue::bounded_queue;
use crate::walker::tree::FileWalker;
use crate::walker::worker::{
    aggregate_stats, FsOpener, SourceOpener, Worker, WorkerContext, WorkerStats,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Walker, workers and consumers all running
    Feeding,
    /// Job queue closed; waiting for workers, then the logger
    Draining,
}

/// Result of a completed scan
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Files pushed onto the job queue
    pub files_queued: u64,

    /// Results written by the logger
    pub files_logged: u64,

    /// Files with at least one zero block
    pub files_with_zero_blocks: u64,

    /// Zero blocks across all files
    pub zero_blocks: u64,

    /// Files that could not be scanned
    pub failed_files: u64,

    /// Directory entries that could not be read
    pub walk_errors: u64,

    /// Entries skipped by exclude patterns
    pub excluded: u64,

    /// Sum of queued file sizes at discovery time
    pub bytes_queued: u64,

    /// Sum of logged file sizes
    pub bytes: u64,

    /// Bytes actually read from disk
    pub bytes_read: u64,

    /// Chunk compares performed
    pub chunks: u64,

    /// The log file stopped accepting writes
    pub log_file_failed: bool,

    /// Wall-clock start of the scan
    pub started_at: DateTime<Utc>,

    /// Time taken for the scan
    pub duration: Duration,

    /// False once the error budget was exhausted, even if the walk had already finished
    pub completed: bool,
}

/// Coordinates the parallel scan
pub struct ScanCoordinator {
    /// Configuration
    config: Arc<ScanConfig>,

    /// Stop/halt flags and error budget
    control: Arc<PipelineControl>,

    /// Rate monitor reporting window
    rate_interval: Duration,

    /// Source of file contents for the workers
    opener: Arc<dyn SourceOpener>,
}

impl ScanCoordinator {
    /// Create a new scan coordinator
    pub fn new(config: ScanConfig) -> Self {
        let control = Arc::new(PipelineControl::new(config.max_errors));

        Self {
            config: Arc::new(config),
            control,
            rate_interval: RATE_INTERVAL,
            opener: Arc::new(FsOpener),
        }
    }

    /// Override the rate monitor window
    pub fn with_rate_interval(mut self, interval: Duration) -> Self {
        self.rate_interval = interval;
        self
    }

    /// Read file contents through `opener` instead of the local filesystem
    pub fn with_opener(mut self, opener: Arc<dyn SourceOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Run the scan to completion
    pub fn run(self) -> Result<ScanSummary> {
        let start_time = Instant::now();
        let started_at = Utc::now();

        info!(
            root = %self.config.root.display(),
            workers = self.config.worker_count,
            "Starting scan"
        );

        let capacity = self.config.worker_count;
        let (job_tx, job_rx) = bounded_queue::<FileJob>(capacity);
        let (result_tx, result_rx) = bounded_queue::<ScanResult>(capacity);
        let (progress_tx, progress_rx) = crossbeam_channel::bounded::<()>(capacity);

        // Consumers first, so workers never block on a missing reader
        let logger = spawn_logger(
            self.config.log_path.as_deref(),
            self.config.geometry,
            result_rx,
        )?;
        let interval = self.rate_interval;
        let monitor = spawn_rate_monitor(progress_rx, interval, move |n| log_rate(n, interval))?;

        let ctx = WorkerContext {
            jobs: job_rx,
            results: result_tx,
            progress: progress_tx,
            control: Arc::clone(&self.control),
            opener: Arc::clone(&self.opener),
        };
        let workers = self.spawn_workers(&ctx)?;

        // Workers hold the only remaining queue handles from here on
        drop(ctx);

        let mut phase = PipelinePhase::Feeding;
        debug!(phase = ?phase, "Pipeline phase");

        let walk = FileWalker::new(Arc::clone(&self.config)).feed(&job_tx, &self.control);
        let job_stats = job_tx.stats();
        drop(job_tx);

        phase = PipelinePhase::Draining;
        debug!(phase = ?phase, "Pipeline phase");

        let stats: Vec<Arc<WorkerStats>> = workers.iter().map(Worker::stats_handle).collect();
        let fatal = join_workers(workers);
        let totals = aggregate_stats(&stats);
        debug!(
            dequeued = job_stats.throughput(),
            abandoned = job_stats.in_flight(),
            "Workers finished"
        );

        let log = logger
            .join()
            .map_err(|_| ScanError::ConsumerPanicked("result logger"))?;
        let chunks_seen = monitor
            .join()
            .map_err(|_| ScanError::ConsumerPanicked("rate monitor"))?;

        if let Some(e) = fatal {
            return Err(e.into());
        }

        if chunks_seen != totals.chunks {
            warn!(
                monitor = chunks_seen,
                workers = totals.chunks,
                "Rate monitor missed progress signals"
            );
        }

        let duration = start_time.elapsed();
        let completed = !walk.stopped_early && !self.control.should_stop_feeding();

        if walk.files_queued != log.files_logged {
            error!(
                queued = walk.files_queued,
                logged = log.files_logged,
                "Queued and logged file counts differ"
            );
        }

        info!(
            files = log.files_logged,
            zero_blocks = log.zero_blocks,
            failed = log.failed,
            duration_secs = duration.as_secs(),
            "Scan completed"
        );

        Ok(ScanSummary {
            files_queued: walk.files_queued,
            files_logged: log.files_logged,
            files_with_zero_blocks: log.files_with_zero_blocks,
            zero_blocks: log.zero_blocks,
            failed_files: log.failed,
            walk_errors: walk.walk_errors,
            excluded: walk.excluded,
            bytes_queued: walk.bytes_queued,
            bytes: log.bytes,
            bytes_read: totals.bytes_read,
            chunks: totals.chunks,
            log_file_failed: log.log_file_failed,
            started_at,
            duration,
            completed,
        })
    }

    /// Spawn worker threads
    fn spawn_workers(&self, ctx: &WorkerContext) -> Result<Vec<Worker>> {
        let mut workers = Vec::with_capacity(self.config.worker_count);

        for id in 0..self.config.worker_count {
            let scanner = ZeroBlockScanner::new(self.config.geometry);
            workers.push(Worker::spawn(id, scanner, ctx.clone())?);
        }

        info!(count = workers.len(), "Workers spawned");
        Ok(workers)
    }
}

/// Join all worker threads, keeping the first fatal error
fn join_workers(workers: Vec<Worker>) -> Option<WorkerError> {
    let mut fatal = None;

    for worker in workers {
        let id = worker.id();
        if let Err(e) = worker.join() {
            error!(worker = id, error = %e, "Worker failed");
            fatal.get_or_insert(e);
        }
    }

    fatal
}
