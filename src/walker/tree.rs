//! Directory tree walker
//!
//! Traverses the scan root depth-first with `walkdir` and yields one
//! [`FileJob`] per regular file. Directories, unfollowed symlinks, FIFOs,
//! sockets and device nodes are never emitted. An unreadable entry is
//! reported and skipped. It never stops the walk.
//!
//! The walker runs on the coordinator's thread. Feeding blocks on the
//! bounded job queue, so traversal only runs as far ahead of the workers
//! as the queue capacity allows.

use crate::config::ScanConfig;
use crate::types::FileJob;
use crate::walker::control::PipelineControl;
use crate::walker::queue::QueueSender;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Counters for one traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Files pushed onto the job queue
    pub files_queued: u64,

    /// Sum of queued file sizes
    pub bytes_queued: u64,

    /// Entries that could not be read
    pub walk_errors: u64,

    /// Entries skipped by exclude patterns
    pub excluded: u64,

    /// Whether feeding stopped before traversal finished
    pub stopped_early: bool,
}

/// Walks the scan root and produces file jobs
pub struct FileWalker {
    config: Arc<ScanConfig>,
}

impl FileWalker {
    /// Create a walker for the configured root
    pub fn new(config: Arc<ScanConfig>) -> Self {
        Self { config }
    }

    /// Lazily enumerate regular files under the root
    pub fn jobs(&self) -> FileJobs<'_> {
        let mut walk = WalkDir::new(&self.config.root).follow_links(self.config.follow_links);
        if let Some(depth) = self.config.max_depth {
            walk = walk.max_depth(depth);
        }

        FileJobs {
            entries: walk.into_iter(),
            config: &self.config,
            walk_errors: 0,
            excluded: 0,
        }
    }

    /// Walk the tree and push every job onto `queue`
    ///
    /// Blocks while the queue is full. Stops early if the pipeline asks
    /// feeding to stop or the queue's receivers are gone.
    pub fn feed(&self, queue: &QueueSender<FileJob>, control: &PipelineControl) -> WalkSummary {
        let mut summary = WalkSummary::default();
        let mut jobs = self.jobs();

        for job in jobs.by_ref() {
            if control.should_stop_feeding() {
                summary.stopped_early = true;
                break;
            }

            let size = job.size;
            trace!(path = %job.path.display(), size = size, "Queueing file");

            if queue.send(job).is_err() {
                warn!("Job queue closed, stopping walk");
                summary.stopped_early = true;
                break;
            }

            summary.files_queued += 1;
            summary.bytes_queued += size;
        }

        summary.walk_errors = jobs.walk_errors;
        summary.excluded = jobs.excluded;

        debug!(
            files = summary.files_queued,
            errors = summary.walk_errors,
            excluded = summary.excluded,
            stopped_early = summary.stopped_early,
            "Walk finished"
        );

        summary
    }
}

/// Iterator over the regular files of a tree
pub struct FileJobs<'a> {
    entries: walkdir::IntoIter,
    config: &'a ScanConfig,
    walk_errors: u64,
    excluded: u64,
}

impl FileJobs<'_> {
    /// Entries that could not be read so far
    pub fn walk_errors(&self) -> u64 {
        self.walk_errors
    }

    /// Entries skipped by exclude patterns so far
    pub fn excluded(&self) -> u64 {
        self.excluded
    }
}

impl Iterator for FileJobs<'_> {
    type Item = FileJob;

    fn next(&mut self) -> Option<FileJob> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    self.walk_errors += 1;
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!(path = %path, error = %e, "Failed to walk");
                    continue;
                }
            };

            if entry.depth() > 0 && self.config.is_excluded(&entry.path().to_string_lossy()) {
                self.excluded += 1;
                if entry.file_type().is_dir() {
                    self.entries.skip_current_dir();
                }
                trace!(path = %entry.path().display(), "Excluded");
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    self.walk_errors += 1;
                    warn!(path = %entry.path().display(), error = %e, "Failed to walk");
                    continue;
                }
            };

            return Some(FileJob::new(
                entry.into_path(),
                metadata.len(),
                metadata.modified().ok(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::queue::bounded_queue;
    use regex::Regex;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn make_tree(root: &std::path::Path) {
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::create_dir_all(root.join("skip/deep")).unwrap();
        fs::write(root.join("top.bin"), b"top").unwrap();
        fs::write(root.join("a/one.bin"), vec![0u8; 100]).unwrap();
        fs::write(root.join("a/b/two.bin"), b"").unwrap();
        fs::write(root.join("a/b/c/three.bin"), b"three").unwrap();
        fs::write(root.join("skip/deep/hidden.bin"), b"hidden").unwrap();
    }

    fn sorted_paths(jobs: impl Iterator<Item = FileJob>) -> Vec<PathBuf> {
        let mut paths: Vec<_> = jobs.map(|job| job.path).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_emits_only_regular_files() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(dir.path())));
        let paths = sorted_paths(walker.jobs());

        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|p| p.is_file()));
        assert!(paths.contains(&dir.path().join("a/b/two.bin")));
    }

    #[test]
    fn test_job_carries_size() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sized.bin"), vec![7u8; 1234]).unwrap();

        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(dir.path())));
        let jobs: Vec<_> = walker.jobs().collect();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].size, 1234);
        assert!(jobs[0].modified.is_some());
    }

    #[test]
    fn test_exclude_prunes_directory() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let mut config = ScanConfig::for_root(dir.path());
        config.exclude_patterns = vec![Regex::new("/skip$").unwrap()];
        let walker = FileWalker::new(Arc::new(config));

        let mut jobs = walker.jobs();
        let paths = sorted_paths(jobs.by_ref());
        assert_eq!(paths.len(), 4);
        assert!(!paths.iter().any(|p| p.ends_with("hidden.bin")));
        assert_eq!(jobs.excluded(), 1);
        assert_eq!(jobs.walk_errors(), 0);
    }

    #[test]
    fn test_max_depth() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let mut config = ScanConfig::for_root(dir.path());
        config.max_depth = Some(2);
        let walker = FileWalker::new(Arc::new(config));

        let paths = sorted_paths(walker.jobs());
        assert_eq!(paths, vec![dir.path().join("a/one.bin"), dir.path().join("top.bin")]);
    }

    #[test]
    fn test_root_is_a_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("single.bin");
        fs::write(&file, b"x").unwrap();

        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(&file)));
        let paths = sorted_paths(walker.jobs());
        assert_eq!(paths, vec![file]);
    }

    #[test]
    fn test_missing_root_reports_error() {
        let dir = tempdir().unwrap();
        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(dir.path().join("gone"))));

        let mut jobs = walker.jobs();
        assert!(jobs.next().is_none());
        assert_eq!(jobs.walk_errors(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed_by_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real.bin"), b"data").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.bin"), dir.path().join("link.bin"))
            .unwrap();

        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(dir.path())));
        assert_eq!(walker.jobs().count(), 1);

        let mut config = ScanConfig::for_root(dir.path());
        config.follow_links = true;
        let walker = FileWalker::new(Arc::new(config));
        assert_eq!(walker.jobs().count(), 2);
    }

    #[test]
    fn test_feed_queues_every_file() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(dir.path())));
        let (tx, rx) = bounded_queue(16);
        let control = PipelineControl::default();

        let summary = walker.feed(&tx, &control);
        drop(tx);

        assert_eq!(summary.files_queued, 5);
        assert_eq!(summary.bytes_queued, 3 + 100 + 5 + 6);
        assert!(!summary.stopped_early);

        let mut received = 0;
        while rx.recv().is_some() {
            received += 1;
        }
        assert_eq!(received, 5);
    }

    #[test]
    fn test_feed_stops_when_asked() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let walker = FileWalker::new(Arc::new(ScanConfig::for_root(dir.path())));
        let (tx, _rx) = bounded_queue(16);
        let control = PipelineControl::default();
        control.halt();

        let summary = walker.feed(&tx, &control);
        assert_eq!(summary.files_queued, 0);
        assert!(summary.stopped_early);
    }
}
