//! Parallel scan pipeline
//!
//! The walker feeds regular files into a bounded job queue. A fixed pool of
//! workers scans them and pushes one result each into a bounded results
//! queue, drained by a single logger thread.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │       FileWalker        │
//!                     │  - Calling thread       │
//!                     │  - Regular files only   │
//!                     └───────────┬─────────────┘
//!                                 │ job queue (bounded)
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │  Scanner  │             │  Scanner  │             │  Scanner  │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       │ results (bounded)       │           progress      │
//!       └──────────┬──────────────┴──────────────┬──────────┘
//!                  ▼                             ▼
//!         ┌────────────────┐            ┌────────────────┐
//!         │ Result logger  │            │  Rate monitor  │
//!         └────────────────┘            └────────────────┘
//! ```

pub mod control;
pub mod coordinator;
pub mod queue;
pub mod tree;
pub mod worker;

pub use control::PipelineControl;
pub use coordinator::{PipelinePhase, ScanCoordinator, ScanSummary};
pub use queue::{bounded_queue, QueueReceiver, QueueSender, QueueStats};
pub use tree::{FileJobs, FileWalker, WalkSummary};
pub use worker::{
    aggregate_stats, FsOpener, ScanSource, SourceOpener, Worker, WorkerContext, WorkerStats,
    WorkerTotals,
};
