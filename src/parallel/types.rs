//! Type definitions for parallel file reading
//!
//! Contains byte ranges, per-range results, errors and reader configuration.

use std::io;
use std::path::PathBuf;

use crate::entry::LogEntry;
use crate::parsers::ParserKind;
use crate::platform::Interrupted;
use crate::stats::ReadStats;

use super::splitter::SplitError;

/// Worker count used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 4;
/// Initial lookahead window the splitter reads at each tentative boundary.
pub const DEFAULT_LOOKAHEAD_BYTES: usize = 256;
/// Longest line a worker will buffer before treating the file as corrupt.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;
/// Typical size of one record on disk, used to presize per-range buffers.
pub const AVERAGE_RECORD_BYTES: u64 = 80;

/// Configuration for parallel reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Number of ranges (and worker threads); 0 means one per logical CPU.
    pub workers: usize,
    pub lookahead_bytes: usize,
    pub max_line_bytes: usize,
    pub parser: ParserKind,
}

impl ReaderConfig {
    /// Worker count with the "auto" value resolved.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            lookahead_bytes: DEFAULT_LOOKAHEAD_BYTES,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            parser: ParserKind::Fast,
        }
    }
}

/// Half-open byte span `[offset, offset + length)` of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Expected number of records, for presizing the entry buffer.
    pub fn capacity_hint(&self) -> usize {
        usize::try_from(self.length / AVERAGE_RECORD_BYTES).unwrap_or(usize::MAX)
    }
}

/// Result of reading one range
#[derive(Debug)]
pub struct RangeBatch {
    pub index: usize,
    pub entries: Vec<LogEntry>,
    pub stats: ReadStats,
}

/// Everything a successful file read produces.
#[derive(Debug, Default)]
pub struct FileRead {
    pub entries: Vec<LogEntry>,
    pub stats: ReadStats,
}

/// Fatal failure of a file read. Malformed lines never produce one of these.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to stat {}: {source}", path.display())]
    Metadata { path: PathBuf, source: io::Error },

    #[error("failed to seek {} to byte {offset}: {source}", path.display())]
    Seek {
        path: PathBuf,
        offset: u64,
        source: io::Error,
    },

    #[error("failed to read {} near byte {offset}: {source}", path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        source: io::Error,
    },

    #[error("line at byte {offset} of {} is longer than {limit} bytes", path.display())]
    LineTooLong {
        path: PathBuf,
        offset: u64,
        limit: usize,
    },

    #[error("failed to split {}: {source}", path.display())]
    Split { path: PathBuf, source: SplitError },

    #[error("failed to start range worker: {0}")]
    Spawn(io::Error),

    #[error("range worker {index} panicked")]
    WorkerPanicked { index: usize },

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl ReadError {
    /// The interruption behind this error, if it is one.
    pub fn interrupted(&self) -> Option<Interrupted> {
        match self {
            ReadError::Interrupted(i) => Some(*i),
            _ => None,
        }
    }
}
