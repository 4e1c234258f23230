//! Block geometry and the shared zero reference
//!
//! Every worker compares against the same read-only zero page. Buffers
//! larger than the page are compared one page-sized window at a time, so
//! no per-scan zero buffer is ever allocated.

use crate::error::ConfigError;

/// Default probe chunk size (bytes)
pub const DEFAULT_CHUNK_SIZE: u64 = 512;

/// Default zero-block size (bytes)
pub const DEFAULT_BLOCK_SIZE: u64 = 4 * 1024 * 1024;

const ZERO_PAGE_LEN: usize = 64 * 1024;

/// Immutable zero reference shared by all workers
static ZERO_PAGE: [u8; ZERO_PAGE_LEN] = [0; ZERO_PAGE_LEN];

/// Returns true if every byte is zero.
pub fn is_all_zeros(bytes: &[u8]) -> bool {
    bytes
        .chunks(ZERO_PAGE_LEN)
        .all(|window| window == &ZERO_PAGE[..window.len()])
}

/// Validated chunk/block size pair
///
/// A block is one probe chunk followed by a tail of `block - chunk` bytes.
/// The block must be a whole number of chunks so that skipping a block
/// lands the read cursor back on a chunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    chunk: u64,
    block: u64,
}

impl BlockGeometry {
    /// Create a geometry, rejecting pairs that break chunk alignment
    pub fn new(chunk: u64, block: u64) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidGeometry {
            chunk,
            block,
            reason: reason.to_string(),
        };

        if chunk == 0 {
            return Err(invalid("chunk size must be non-zero"));
        }
        if block <= chunk {
            return Err(invalid("block size must be larger than chunk size"));
        }
        if block % chunk != 0 {
            return Err(invalid("block size must be a multiple of chunk size"));
        }
        if usize::try_from(block).is_err() || i64::try_from(block).is_err() {
            return Err(invalid("block size does not fit in memory"));
        }

        Ok(Self { chunk, block })
    }

    /// Probe chunk size in bytes
    pub fn chunk(&self) -> u64 {
        self.chunk
    }

    /// Zero-block size in bytes
    pub fn block(&self) -> u64 {
        self.block
    }

    /// Bytes following the probe chunk within one block
    pub fn tail(&self) -> u64 {
        self.block - self.chunk
    }

    /// Block size as shown in log lines
    ///
    /// Whole KiB sizes print as `4096.0k`. Anything else prints the exact
    /// byte count, e.g. `1536B`.
    pub fn block_label(&self) -> String {
        if self.block % 1024 == 0 {
            format!("{:.1}k", self.block as f64 / 1024.0)
        } else {
            format!("{}B", self.block)
        }
    }
}

impl Default for BlockGeometry {
    fn default() -> Self {
        Self {
            chunk: DEFAULT_CHUNK_SIZE,
            block: DEFAULT_BLOCK_SIZE,
        }
    }
}
