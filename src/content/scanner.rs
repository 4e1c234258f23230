//! Chunk-then-block zero detection
//!
//! The scanner walks a byte stream one block at a time. It reads only the
//! leading chunk of each block first. Blocks whose leading chunk holds any
//! non-zero byte are skipped with a seek. Only blocks that start with a
//! zero chunk have their tail read and compared.
//!
//! ```text
//!  offset 0            B                  2B
//!  ├─ C ─┬── tail ─────┼─ C ─┬── tail ────┼── ...
//!  │probe│ (read only  │probe│ (skipped)  │
//!  │ 0s  │  if probe 0)│ !0  │            │
//! ```
//!
//! Before every probe the read cursor must sit on a multiple of C. A cursor
//! anywhere else (short of end of stream) means the offset bookkeeping is
//! broken and the scan is aborted with [`ScanFault::Misaligned`].

use crate::content::zero::{is_all_zeros, BlockGeometry};
use crate::error::ScanFault;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Which read of a block came back short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    /// Leading chunk of a block
    Probe,
    /// Remainder of a block after a zero probe
    Tail,
}

/// A read that ended before filling its buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    /// Which part of the block was being read
    pub phase: ReadPhase,
    /// Stream offset where the read started
    pub offset: u64,
    /// Bytes requested
    pub expected: u64,
    /// Bytes actually available
    pub got: u64,
}

/// Outcome of scanning one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Blocks found entirely zero
    pub zero_blocks: u64,

    /// Chunk compares performed
    pub chunks: u64,

    /// Bytes actually read (skipped tails are not counted)
    pub bytes_read: u64,

    /// Partial final read, if the stream ended mid-chunk or mid-tail
    pub short_read: Option<ShortRead>,
}

/// Zero-block scanner with reusable read buffers
///
/// Holds one chunk-sized probe buffer and one tail buffer. The tail buffer
/// is only allocated the first time a zero probe is seen.
pub struct ZeroBlockScanner {
    geometry: BlockGeometry,
    probe: Vec<u8>,
    tail: Vec<u8>,
}

impl ZeroBlockScanner {
    /// Create a scanner for the given geometry
    pub fn new(geometry: BlockGeometry) -> Self {
        Self {
            geometry,
            probe: vec![0; geometry.chunk() as usize],
            tail: Vec::new(),
        }
    }

    /// Geometry this scanner was built with
    pub fn geometry(&self) -> BlockGeometry {
        self.geometry
    }

    /// Scan `source` from its current position to end of stream
    ///
    /// `len` is the stream length as reported by the file's metadata. A
    /// cursor equal to `len` is accepted even when unaligned.
    ///
    /// `on_chunk` is invoked once per completed chunk compare, whatever the
    /// compare's outcome.
    pub fn scan<R, F>(
        &mut self,
        source: &mut R,
        len: u64,
        mut on_chunk: F,
    ) -> Result<ScanReport, ScanFault>
    where
        R: Read + Seek,
        F: FnMut(),
    {
        let chunk = self.geometry.chunk();
        let tail_len = self.geometry.tail();
        let mut report = ScanReport::default();

        loop {
            let offset = source
                .stream_position()
                .map_err(|source| ScanFault::Io { offset: report.bytes_read, source })?;

            if offset % chunk != 0 && offset != len {
                return Err(ScanFault::Misaligned { offset, chunk });
            }

            let n = fill(source, &mut self.probe)
                .map_err(|source| ScanFault::Io { offset, source })?;
            report.bytes_read += n as u64;

            if n == 0 {
                return Ok(report);
            }
            if (n as u64) < chunk {
                report.short_read = Some(ShortRead {
                    phase: ReadPhase::Probe,
                    offset,
                    expected: chunk,
                    got: n as u64,
                });
                return Ok(report);
            }

            let probe_is_zero = is_all_zeros(&self.probe);
            report.chunks += 1;
            on_chunk();

            if !probe_is_zero {
                // tail() fits in i64, checked by BlockGeometry::new
                source
                    .seek(SeekFrom::Current(tail_len as i64))
                    .map_err(|source| ScanFault::Io { offset, source })?;
                continue;
            }

            if self.tail.len() as u64 != tail_len {
                self.tail.resize(tail_len as usize, 0);
            }

            let tail_offset = offset + chunk;
            let n = fill(source, &mut self.tail).map_err(|source| ScanFault::Io {
                offset: tail_offset,
                source,
            })?;
            report.bytes_read += n as u64;

            if (n as u64) < tail_len {
                if n > 0 {
                    report.short_read = Some(ShortRead {
                        phase: ReadPhase::Tail,
                        offset: tail_offset,
                        expected: tail_len,
                        got: n as u64,
                    });
                }
                return Ok(report);
            }

            if is_all_zeros(&self.tail) {
                report.zero_blocks += 1;
            }
        }
    }
}

/// Read until `buf` is full or the source reports end of stream
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
