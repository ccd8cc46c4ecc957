//! Main parallel reader
//!
//! Splits a file into line-aligned ranges, fans the ranges out to one worker
//! thread each and merges their entries back into a single collection.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::entry::LogEntry;
use crate::parsers::EntryParser;
use crate::platform::{CancelContext, Interrupted};

use super::splitter::RangeSplitter;
use super::types::{ByteRange, FileRead, RangeBatch, ReadError, ReaderConfig};
use super::worker::{range_worker_thread, RangeJob};

type RangeOutcome = Result<RangeBatch, ReadError>;

/// Main parallel reader
pub struct ParallelReader {
    config: ReaderConfig,
    parser: Arc<dyn EntryParser>,
}

impl ParallelReader {
    pub fn new(config: ReaderConfig) -> Self {
        let parser = Arc::from(config.parser.build());
        Self { config, parser }
    }

    /// Replace the parser chosen by the config.
    pub fn with_parser(mut self, parser: Arc<dyn EntryParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read and parse `path` in parallel.
    ///
    /// Malformed lines are skipped and counted. Any I/O failure, split
    /// failure or interruption aborts the whole read; no partial entries are
    /// returned in that case. Entries come back in file order.
    pub fn read_file(
        &self,
        path: impl AsRef<Path>,
        ctx: &CancelContext,
    ) -> Result<FileRead, ReadError> {
        let path = path.as_ref();
        ctx.check()?;

        let ranges = self.compute_ranges(path)?;
        tracing::debug!(
            path = %path.display(),
            ranges = ranges.len(),
            "computed byte ranges"
        );

        let read = self.read_ranges(path, ranges, ctx)?;
        tracing::debug!(
            path = %path.display(),
            entries = read.stats.entries,
            skipped = read.stats.lines_skipped,
            "file read complete"
        );
        Ok(read)
    }

    /// Line-aligned ranges for `path` under the current configuration.
    pub fn compute_ranges(&self, path: &Path) -> Result<Vec<ByteRange>, ReadError> {
        let mut file = File::open(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let file_size = file
            .metadata()
            .map_err(|source| ReadError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        RangeSplitter::from_config(&self.config)
            .split(&mut file, file_size)
            .map_err(|source| ReadError::Split {
                path: path.to_path_buf(),
                source,
            })
    }

    fn read_ranges(
        &self,
        path: &Path,
        ranges: Vec<ByteRange>,
        ctx: &CancelContext,
    ) -> Result<FileRead, ReadError> {
        let path: Arc<Path> = Arc::from(path);
        let abort = Arc::new(AtomicBool::new(false));
        let (result_sender, result_receiver) = bounded(ranges.len().max(1));

        let mut handles = Vec::with_capacity(ranges.len());
        let mut dispatch_error = None;

        for (index, range) in ranges.into_iter().enumerate() {
            if let Err(interrupted) = ctx.check() {
                dispatch_error = Some(ReadError::from(interrupted));
                break;
            }

            let job = RangeJob {
                index,
                path: Arc::clone(&path),
                range,
                max_line_bytes: self.config.max_line_bytes,
            };
            let parser = Arc::clone(&self.parser);
            let worker_ctx = ctx.clone();
            let worker_abort = Arc::clone(&abort);
            let sender = result_sender.clone();

            let spawned = thread::Builder::new()
                .name(format!("range-{}", index))
                .spawn(move || range_worker_thread(job, parser, worker_ctx, worker_abort, sender));

            match spawned {
                Ok(handle) => handles.push((index, handle)),
                Err(e) => {
                    dispatch_error = Some(ReadError::Spawn(e));
                    break;
                }
            }
        }
        drop(result_sender);

        let outcome = match dispatch_error {
            Some(e) => Err(e),
            None => collect_ranges(&result_receiver, handles.len(), ctx),
        };
        if outcome.is_err() {
            abort.store(true, Ordering::Relaxed);
        }

        let mut panicked = None;
        for (index, handle) in handles {
            if handle.join().is_err() {
                panicked.get_or_insert(index);
            }
        }

        match (outcome, panicked) {
            (Err(e), _) => Err(e),
            (Ok(_), Some(index)) => Err(ReadError::WorkerPanicked { index }),
            (Ok(read), None) => Ok(read),
        }
    }
}

/// Fan-in: wait for every worker, stopping at the first error or at the
/// context deadline.
fn collect_ranges(
    receiver: &Receiver<RangeOutcome>,
    expected: usize,
    ctx: &CancelContext,
) -> Result<FileRead, ReadError> {
    let mut batches = Vec::with_capacity(expected);

    for _ in 0..expected {
        let message = match ctx.deadline() {
            Some(deadline) => match receiver.recv_deadline(deadline) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(Interrupted::DeadlineExceeded.into())
                }
                // A panicked worker; reported after join
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        let batch = message?;
        tracing::debug!(
            range = batch.index,
            entries = batch.entries.len(),
            skipped = batch.stats.lines_skipped,
            "range finished"
        );
        batches.push(batch);
    }

    batches.sort_by_key(|batch| batch.index);
    let mut read = FileRead::default();
    read.entries
        .reserve_exact(batches.iter().map(|b| b.entries.len()).sum());
    for batch in batches {
        read.stats.merge(&batch.stats);
        read.entries.extend(batch.entries);
    }
    Ok(read)
}

/// Read `path` with the default configuration: four workers and the fast
/// parser.
pub fn read_file(path: impl AsRef<Path>, ctx: &CancelContext) -> Result<Vec<LogEntry>, ReadError> {
    ParallelReader::new(ReaderConfig::default())
        .read_file(path, ctx)
        .map(|read| read.entries)
}
