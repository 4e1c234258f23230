//! Result logger
//!
//! A single consumer drains the results queue and writes one CSV line per
//! scanned file:
//!
//! ```text
//! <path>,<size>,<size>,<status>
//! ```
//!
//! The size column appears twice for compatibility with existing log
//! readers. Lines go to stdout and, if configured, are appended to a log
//! file. Only this thread ever writes the log file.
//!
//! A failing sink is reported once and then disabled. The logger keeps
//! draining regardless, so workers never block on a dead consumer.

use crate::content::BlockGeometry;
use crate::error::ScanError;
use crate::types::{ScanOutcome, ScanResult};
use crate::walker::queue::QueueReceiver;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, StdoutLock, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Status for a file without zero blocks
pub const STATUS_CLEAN: &str = "Read whole file";

/// Totals for everything the logger has seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSummary {
    /// Results logged
    pub files_logged: u64,

    /// Files with at least one zero block
    pub files_with_zero_blocks: u64,

    /// Zero blocks across all files
    pub zero_blocks: u64,

    /// Files that could not be scanned
    pub failed: u64,

    /// Sum of logged file sizes
    pub bytes: u64,

    /// The log file stopped accepting writes
    pub log_file_failed: bool,

    /// Stdout stopped accepting writes
    pub console_failed: bool,
}

/// Status column for a result
pub fn status(result: &ScanResult, geometry: &BlockGeometry) -> String {
    match &result.outcome {
        ScanOutcome::Scanned { zero_blocks: 0, .. } => STATUS_CLEAN.to_string(),
        ScanOutcome::Scanned { zero_blocks, .. } => format!(
            "file contained {} {} blocks of binary zeroes",
            zero_blocks,
            geometry.block_label()
        ),
        ScanOutcome::Failed { reason } => format!("failed to scan file: {}", reason),
    }
}

/// Full log line for a result, including the trailing newline
pub fn format_line(result: &ScanResult, geometry: &BlockGeometry) -> String {
    format!(
        "{},{},{},{}\n",
        result.path.display(),
        result.size,
        result.size,
        status(result, geometry)
    )
}

/// Open the log file for appending, creating it if absent
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Writes scan results to the console and an optional log file
pub struct ResultLogger<C: Write, F: Write> {
    console: Option<C>,
    file: Option<F>,
    geometry: BlockGeometry,
    summary: LogSummary,
}

impl<C: Write, F: Write> ResultLogger<C, F> {
    /// Create a logger writing to `console` and optionally `file`
    pub fn new(console: C, file: Option<F>, geometry: BlockGeometry) -> Self {
        Self {
            console: Some(console),
            file,
            geometry,
            summary: LogSummary::default(),
        }
    }

    /// Log a single result
    pub fn log(&mut self, result: &ScanResult) {
        let line = format_line(result, &self.geometry);

        if let Some(console) = self.console.as_mut() {
            if let Err(e) = console.write_all(line.as_bytes()) {
                warn!(error = %e, "Failed to write to stdout, console output disabled");
                self.console = None;
                self.summary.console_failed = true;
            }
        }

        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!(error = %e, "Failed to write log file, further lines go to stdout only");
                self.file = None;
                self.summary.log_file_failed = true;
            }
        }

        self.summary.files_logged += 1;
        self.summary.bytes += result.size;
        match result.outcome {
            ScanOutcome::Scanned { zero_blocks, .. } if zero_blocks > 0 => {
                self.summary.files_with_zero_blocks += 1;
                self.summary.zero_blocks += zero_blocks;
            }
            ScanOutcome::Scanned { .. } => {}
            ScanOutcome::Failed { .. } => self.summary.failed += 1,
        }
    }

    /// Drain `results` until the queue is closed and empty
    pub fn run(mut self, results: QueueReceiver<ScanResult>) -> LogSummary {
        while let Some(result) = results.recv() {
            self.log(&result);
        }
        self.finish()
    }

    /// Flush both sinks and return the totals
    pub fn finish(mut self) -> LogSummary {
        if let Some(console) = self.console.as_mut() {
            if console.flush().is_err() {
                self.summary.console_failed = true;
            }
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                warn!(error = %e, "Failed to flush log file");
                self.summary.log_file_failed = true;
            }
        }

        debug!(files = self.summary.files_logged, "Result logger finished");
        self.summary
    }
}

/// Logger thread writing to stdout and the optional log file
pub type ConsoleLogger = ResultLogger<StdoutLock<'static>, LineWriter<File>>;

/// Spawn the result logger thread
///
/// The log file is opened before the thread starts so that a bad path is
/// reported before any file is scanned.
pub fn spawn_logger(
    log_path: Option<&Path>,
    geometry: BlockGeometry,
    results: QueueReceiver<ScanResult>,
) -> Result<JoinHandle<LogSummary>, ScanError> {
    let file = log_path.map(open_log_file).transpose()?.map(LineWriter::new);

    let handle = thread::Builder::new()
        .name("result-logger".into())
        .spawn(move || {
            let logger: ConsoleLogger = ResultLogger::new(io::stdout().lock(), file, geometry);
            logger.run(results)
        })?;

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileJob;
    use crate::walker::queue::bounded_queue;
    use std::io::Read;
    use tempfile::tempdir;

    /// Sink that rejects every write
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn clean(path: &str, size: u64) -> ScanResult {
        ScanResult::scanned(&FileJob::new(path, size, None), 0, 1)
    }

    fn zeroed(path: &str, size: u64, blocks: u64) -> ScanResult {
        ScanResult::scanned(&FileJob::new(path, size, None), blocks, blocks)
    }

    #[test]
    fn test_status_clean() {
        let geometry = BlockGeometry::default();
        assert_eq!(status(&clean("/a", 0), &geometry), "Read whole file");
    }

    #[test]
    fn test_status_zero_blocks() {
        let geometry = BlockGeometry::default();
        assert_eq!(
            status(&zeroed("/a", 4194304, 1), &geometry),
            "file contained 1 4096.0k blocks of binary zeroes"
        );
    }

    #[test]
    fn test_status_small_block_shows_bytes() {
        let geometry = BlockGeometry::new(4, 16).unwrap();
        assert_eq!(
            status(&zeroed("/x", 16, 1), &geometry),
            "file contained 1 16B blocks of binary zeroes"
        );
    }

    #[test]
    fn test_format_line() {
        let geometry = BlockGeometry::default();
        let line = format_line(&zeroed("/data/disk.img", 8388608, 2), &geometry);
        assert_eq!(
            line,
            "/data/disk.img,8388608,8388608,file contained 2 4096.0k blocks of binary zeroes\n"
        );

        let job = FileJob::new("/data/locked", 10, None);
        let failed = ScanResult::failed(&job, "permission denied");
        assert_eq!(
            format_line(&failed, &geometry),
            "/data/locked,10,10,failed to scan file: permission denied\n"
        );
    }

    #[test]
    fn test_logs_to_console_and_file() {
        let geometry = BlockGeometry::default();
        let mut logger = ResultLogger::new(Vec::new(), Some(Vec::new()), geometry);

        logger.log(&clean("/a", 3));
        logger.log(&zeroed("/b", 4194304, 1));

        let console = String::from_utf8(logger.console.clone().unwrap()).unwrap();
        let file = String::from_utf8(logger.file.clone().unwrap()).unwrap();
        assert_eq!(console, file);
        assert_eq!(console.lines().count(), 2);

        let summary = logger.finish();
        assert_eq!(summary.files_logged, 2);
        assert_eq!(summary.files_with_zero_blocks, 1);
        assert_eq!(summary.zero_blocks, 1);
        assert_eq!(summary.bytes, 3 + 4194304);
        assert!(!summary.log_file_failed);
    }

    #[test]
    fn test_file_failure_reported_once_and_scan_continues() {
        let geometry = BlockGeometry::default();
        let mut logger = ResultLogger::new(Vec::new(), Some(BrokenSink), geometry);

        logger.log(&clean("/a", 1));
        assert!(logger.file.is_none());
        logger.log(&clean("/b", 1));

        let console = String::from_utf8(logger.console.clone().unwrap()).unwrap();
        assert_eq!(console.lines().count(), 2);

        let summary = logger.finish();
        assert!(summary.log_file_failed);
        assert_eq!(summary.files_logged, 2);
    }

    #[test]
    fn test_console_failure_keeps_draining() {
        let geometry = BlockGeometry::default();
        let logger: ResultLogger<BrokenSink, Vec<u8>> =
            ResultLogger::new(BrokenSink, None, geometry);

        let (tx, rx) = bounded_queue(2);
        let producer = std::thread::spawn(move || {
            for i in 0..10 {
                tx.send(clean(&format!("/f{}", i), 1)).unwrap();
            }
        });

        let summary = logger.run(rx);
        producer.join().unwrap();
        assert!(summary.console_failed);
        assert_eq!(summary.files_logged, 10);
    }

    #[test]
    fn test_run_drains_until_closed() {
        let geometry = BlockGeometry::default();
        let logger = ResultLogger::new(Vec::new(), None::<Vec<u8>>, geometry);

        let (tx, rx) = bounded_queue(4);
        tx.send(clean("/a", 1)).unwrap();
        tx.send(ScanResult::failed(&FileJob::new("/b", 2, None), "gone")).unwrap();
        drop(tx);

        let summary = logger.run(rx);
        assert_eq!(summary.files_logged, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_log_file_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verify.log");
        std::fs::write(&path, "existing line\n").unwrap();

        let geometry = BlockGeometry::default();
        let file = LineWriter::new(open_log_file(&path).unwrap());
        let mut logger = ResultLogger::new(Vec::new(), Some(file), geometry);
        logger.log(&clean("/a", 5));
        logger.finish();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "existing line\n/a,5,5,Read whole file\n");
    }
}
