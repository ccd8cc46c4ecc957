//! Worker thread for parallel reading
//!
//! Each worker owns one byte range: it opens its own handle, seeks to the
//! range start, and parses lines until the range is exhausted.

use crossbeam_channel::Sender;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::parsers::EntryParser;
use crate::platform::{CancelContext, Interrupted};
use crate::stats::ReadStats;

use super::types::{ByteRange, RangeBatch, ReadError};

/// Lines between cancellation checks.
const POLL_INTERVAL: usize = 1024;
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// One unit of work handed to a worker thread
#[derive(Debug, Clone)]
pub(crate) struct RangeJob {
    pub index: usize,
    pub path: Arc<Path>,
    pub range: ByteRange,
    pub max_line_bytes: usize,
}

/// Worker thread: reads one range and reports the outcome to the collector
pub(crate) fn range_worker_thread(
    job: RangeJob,
    parser: Arc<dyn EntryParser>,
    ctx: CancelContext,
    abort: Arc<AtomicBool>,
    result_sender: Sender<Result<RangeBatch, ReadError>>,
) {
    let result = read_range(&job, parser.as_ref(), &ctx, &abort);
    if let Err(e) = &result {
        tracing::debug!(range = job.index, error = %e, "range worker failed");
    }
    // The collector may already have given up on this file
    let _ = result_sender.send(result);
}

pub(crate) fn read_range(
    job: &RangeJob,
    parser: &dyn EntryParser,
    ctx: &CancelContext,
    abort: &AtomicBool,
) -> Result<RangeBatch, ReadError> {
    let mut stats = ReadStats {
        ranges: 1,
        bytes: job.range.length,
        ..ReadStats::default()
    };

    if job.range.is_empty() {
        return Ok(RangeBatch {
            index: job.index,
            entries: Vec::new(),
            stats,
        });
    }

    let mut file = File::open(&job.path).map_err(|source| ReadError::Open {
        path: job.path.to_path_buf(),
        source,
    })?;
    file.seek(SeekFrom::Start(job.range.offset))
        .map_err(|source| ReadError::Seek {
            path: job.path.to_path_buf(),
            offset: job.range.offset,
            source,
        })?;

    let capacity = usize::try_from(job.range.length)
        .unwrap_or(READ_BUFFER_BYTES)
        .min(READ_BUFFER_BYTES);
    let mut reader = BufReader::with_capacity(capacity, file.take(job.range.length));
    let mut entries = Vec::with_capacity(job.range.capacity_hint());
    let mut line = Vec::with_capacity(256);
    let mut offset = job.range.offset;
    let limit = job.max_line_bytes as u64;

    loop {
        if stats.lines_read % POLL_INTERVAL == 0 {
            if abort.load(Ordering::Relaxed) {
                return Err(Interrupted::Cancelled.into());
            }
            ctx.check()?;
        }

        line.clear();
        let read = (&mut reader)
            .take(limit + 1)
            .read_until(b'\n', &mut line)
            .map_err(|source| ReadError::Read {
                path: job.path.to_path_buf(),
                offset,
                source,
            })?;
        if read == 0 {
            break;
        }
        if read as u64 > limit && line.last() != Some(&b'\n') {
            return Err(ReadError::LineTooLong {
                path: job.path.to_path_buf(),
                offset,
                limit: job.max_line_bytes,
            });
        }

        stats.lines_read += 1;
        let content = line.strip_suffix(b"\n").unwrap_or(&line);
        let content = content.strip_suffix(b"\r").unwrap_or(content);

        if content.trim_ascii().is_empty() {
            stats.lines_blank += 1;
        } else {
            match parser.parse(content) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    stats.lines_skipped += 1;
                    tracing::trace!(offset, error = %e, "skipping malformed line");
                }
            }
        }

        offset += read as u64;
    }

    stats.entries = entries.len();
    Ok(RangeBatch {
        index: job.index,
        entries,
        stats,
    })
}
