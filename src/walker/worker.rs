//! Worker thread logic for parallel file scanning
//!
//! Each worker:
//! - Owns its own scanner with reusable read buffers
//! - Pulls file jobs from the shared job queue
//! - Opens the file read-only and runs the zero-block scan
//! - Emits one progress signal per chunk compared
//! - Pushes exactly one result per job to the results queue
//!
//! Open, stat and read failures become failed results. A misaligned read
//! cursor halts the whole pipeline.

use crate::content::{ReadPhase, ScanReport, ZeroBlockScanner};
use crate::error::{FileError, ScanFault, WorkerError};
use crate::types::{FileJob, ScanResult};
use crate::walker::control::PipelineControl;
use crate::walker::queue::{QueueReceiver, QueueSender};
use crossbeam_channel::Sender;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Files read to the end
    pub files_scanned: AtomicU64,

    /// Bytes actually read
    pub bytes_read: AtomicU64,

    /// Zero blocks found
    pub zero_blocks: AtomicU64,

    /// Chunk compares performed
    pub chunks: AtomicU64,

    /// Files that could not be scanned
    pub errors: AtomicU64,
}

impl WorkerStats {
    fn record_scan(&self, bytes: u64, zero_blocks: u64, chunks: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        self.zero_blocks.fetch_add(zero_blocks, Ordering::Relaxed);
        self.chunks.fetch_add(chunks, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals across every worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTotals {
    pub files_scanned: u64,
    pub bytes_read: u64,
    pub zero_blocks: u64,
    pub chunks: u64,
    pub errors: u64,
}

/// Readable, seekable file contents handed to the scanner
pub trait ScanSource: Read + Seek {}

impl<T: Read + Seek> ScanSource for T {}

/// Opens the file behind a job
pub trait SourceOpener: Send + Sync {
    /// Open `path` read-only, returning the source and its length
    fn open(&self, path: &Path) -> Result<(Box<dyn ScanSource>, u64), FileError>;
}

/// Opens files on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl SourceOpener for FsOpener {
    fn open(&self, path: &Path) -> Result<(Box<dyn ScanSource>, u64), FileError> {
        let file = File::open(path).map_err(|source| FileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let len = file
            .metadata()
            .map_err(|source| FileError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        Ok((Box::new(file), len))
    }
}

/// Channels and shared state a worker needs
#[derive(Clone)]
pub struct WorkerContext {
    /// Incoming file jobs
    pub jobs: QueueReceiver<FileJob>,

    /// Outgoing scan results
    pub results: QueueSender<ScanResult>,

    /// One unit signal per chunk compared
    pub progress: Sender<()>,

    /// Shared stop/halt flags
    pub control: Arc<PipelineControl>,

    /// Source of file contents
    pub opener: Arc<dyn SourceOpener>,
}

/// A worker thread that scans files
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<Result<(), WorkerError>>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        scanner: ZeroBlockScanner,
        ctx: WorkerContext,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("scanner-{}", id))
            .spawn(move || worker_loop(id, scanner, ctx, stats_clone))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Shared handle to the statistics, still readable after `join`
    pub fn stats_handle(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result,
                Err(_) => Err(WorkerError::Panicked {
                    id: self.id,
                    message: "Worker thread panicked".into(),
                }),
            }
        } else {
            Ok(())
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    mut scanner: ZeroBlockScanner,
    ctx: WorkerContext,
    stats: Arc<WorkerStats>,
) -> Result<(), WorkerError> {
    debug!(worker = id, "Worker starting");

    while let Some(job) = ctx.jobs.recv() {
        if ctx.control.is_halted() {
            break;
        }

        let result = match scan_file(&mut scanner, ctx.opener.as_ref(), &job, &ctx.progress) {
            Ok(report) => {
                stats.record_scan(report.bytes_read, report.zero_blocks, report.chunks);
                if report.zero_blocks > 0 {
                    debug!(
                        worker = id,
                        path = %job.path.display(),
                        zero_blocks = report.zero_blocks,
                        "Found zero blocks"
                    );
                }
                ScanResult::scanned(&job, report.zero_blocks, report.chunks)
            }
            Err(FileScanError::Fault(fault)) if fault.is_fatal() => {
                error!(worker = id, path = %job.path.display(), error = %fault, "Scan aborted");
                ctx.control.halt();
                return Err(WorkerError::Misaligned {
                    id,
                    path: job.path,
                    fault,
                });
            }
            Err(e) => {
                stats.record_error();
                warn!(worker = id, path = %job.path.display(), error = %e, "File scan failed");
                if ctx.control.record_file_error() {
                    warn!(
                        errors = ctx.control.file_errors(),
                        "Error budget exhausted, no more files will be queued"
                    );
                }
                ScanResult::failed(&job, e.to_string())
            }
        };

        if ctx.results.send(result).is_err() {
            error!(worker = id, "Results queue closed unexpectedly");
            break;
        }
    }

    debug!(
        worker = id,
        files = stats.files_scanned.load(Ordering::Relaxed),
        errors = stats.errors.load(Ordering::Relaxed),
        "Worker shutting down"
    );

    Ok(())
}

/// Why a single file could not be scanned
#[derive(Debug, thiserror::Error)]
enum FileScanError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Fault(#[from] ScanFault),
}

/// Open one file and scan it
///
/// The source is dropped on every return path.
fn scan_file(
    scanner: &mut ZeroBlockScanner,
    opener: &dyn SourceOpener,
    job: &FileJob,
    progress: &Sender<()>,
) -> Result<ScanReport, FileScanError> {
    let (mut source, len) = opener.open(&job.path)?;

    // Monitor gone only means nobody is counting; keep scanning
    let report = scanner.scan(&mut source, len, || {
        let _ = progress.send(());
    })?;

    if let Some(short) = report.short_read {
        let phase = match short.phase {
            ReadPhase::Probe => "chunk",
            ReadPhase::Tail => "block tail",
        };
        warn!(
            path = %job.path.display(),
            offset = short.offset,
            expected = short.expected,
            got = short.got,
            "Didn't read full {}, treating as end of file",
            phase
        );
    }

    trace!(path = %job.path.display(), chunks = report.chunks, "File scanned");
    Ok(report)
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(stats: &[Arc<WorkerStats>]) -> WorkerTotals {
    stats.iter().fold(WorkerTotals::default(), |mut totals, stats| {
        totals.files_scanned += stats.files_scanned.load(Ordering::Relaxed);
        totals.bytes_read += stats.bytes_read.load(Ordering::Relaxed);
        totals.zero_blocks += stats.zero_blocks.load(Ordering::Relaxed);
        totals.chunks += stats.chunks.load(Ordering::Relaxed);
        totals.errors += stats.errors.load(Ordering::Relaxed);
        totals
    })
}
