//! Parallel file reading
//!
//! A file is split into line-aligned byte ranges, each range is read and
//! parsed on its own thread, and the per-range results are merged.
//!
//! # Module Structure
//!
//! - `types`: Byte ranges, per-range results, errors and configuration
//! - `splitter`: Line-aligned range computation
//! - `worker`: Worker thread reading a single range
//! - `processor`: `ParallelReader` fan-out/fan-in orchestration

mod processor;
mod splitter;
mod types;
mod worker;

pub use processor::{read_file, ParallelReader};
pub use splitter::{RangeSplitter, SplitError};
pub use types::{
    ByteRange, FileRead, RangeBatch, ReadError, ReaderConfig, DEFAULT_LOOKAHEAD_BYTES,
    DEFAULT_MAX_LINE_BYTES, DEFAULT_WORKERS,
};
