//! Records passed between pipeline stages

use std::path::PathBuf;
use std::time::SystemTime;

/// A regular file discovered by the walker, waiting to be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    /// Full path to the file
    pub path: PathBuf,

    /// Size in bytes at discovery time
    pub size: u64,

    /// Modification time at discovery time, if the platform reports one
    pub modified: Option<SystemTime>,
}

impl FileJob {
    /// Create a job for `path`
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }
}

/// What scanning a file produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The file was read to the end
    Scanned {
        /// Blocks found entirely zero
        zero_blocks: u64,
        /// Chunk compares performed
        chunks: u64,
    },

    /// The file could not be opened, stat'ed or read
    Failed { reason: String },
}

/// Result of scanning one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Path of the scanned file
    pub path: PathBuf,

    /// Size in bytes as reported when the job was created
    pub size: u64,

    /// Scan outcome
    pub outcome: ScanOutcome,
}

impl ScanResult {
    /// Result for a file that was read to the end
    pub fn scanned(job: &FileJob, zero_blocks: u64, chunks: u64) -> Self {
        Self {
            path: job.path.clone(),
            size: job.size,
            outcome: ScanOutcome::Scanned { zero_blocks, chunks },
        }
    }

    /// Result for a file that could not be scanned
    pub fn failed(job: &FileJob, reason: impl Into<String>) -> Self {
        Self {
            path: job.path.clone(),
            size: job.size,
            outcome: ScanOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    /// Returns true if the file could not be scanned
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ScanOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_result_constructors() {
        let job = FileJob::new("/data/file.bin", 4096, None);

        let ok = ScanResult::scanned(&job, 2, 10);
        assert_eq!(ok.path, PathBuf::from("/data/file.bin"));
        assert_eq!(ok.size, 4096);
        assert_eq!(ok.outcome, ScanOutcome::Scanned { zero_blocks: 2, chunks: 10 });
        assert!(!ok.is_failed());

        let failed = ScanResult::failed(&job, "permission denied");
        assert_eq!(failed.size, 4096);
        assert!(failed.is_failed());
    }
}
