//! Content analysis for zero-block detection
//!
//! This module provides:
//! - Block geometry and the shared zero reference
//! - The chunk-then-block zero scanner

pub mod scanner;
pub mod zero;

pub use scanner::{ReadPhase, ScanReport, ShortRead, ZeroBlockScanner};
pub use zero::{is_all_zeros, BlockGeometry, DEFAULT_BLOCK_SIZE, DEFAULT_CHUNK_SIZE};
