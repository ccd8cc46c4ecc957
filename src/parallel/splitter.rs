//! Line-aligned range splitting
//!
//! A file of `file_size` bytes is cut into `parts` chunks of
//! `file_size / parts` bytes. Every boundary except end-of-file is then pushed
//! forward past the next `\n`, so no record straddles two workers. Each range
//! starts exactly where the previous one ended, which keeps the partition
//! exact even when a long line swallows a whole tentative chunk.

use std::io::{self, Read, Seek, SeekFrom};

use super::types::{ByteRange, ReaderConfig, DEFAULT_LOOKAHEAD_BYTES, DEFAULT_MAX_LINE_BYTES};

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("no line terminator within {searched} bytes after offset {offset}")]
    NoLineBoundary { offset: u64, searched: usize },

    #[error("failed to read lookahead window at byte {offset}: {source}")]
    Io { offset: u64, source: io::Error },
}

#[derive(Debug, Clone)]
pub struct RangeSplitter {
    parts: usize,
    lookahead: usize,
    max_line_bytes: usize,
}

impl RangeSplitter {
    pub fn new(parts: usize) -> Self {
        Self {
            parts: parts.max(1),
            lookahead: DEFAULT_LOOKAHEAD_BYTES,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(config.effective_workers())
            .with_lookahead(config.lookahead_bytes)
            .with_max_line_bytes(config.max_line_bytes)
    }

    pub fn with_lookahead(mut self, bytes: usize) -> Self {
        self.lookahead = bytes.max(1);
        self
    }

    /// Upper bound for lookahead widening. A boundary with no terminator
    /// within this many bytes fails the split.
    pub fn with_max_line_bytes(mut self, bytes: usize) -> Self {
        self.max_line_bytes = bytes.max(1);
        self
    }

    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Compute `parts` contiguous ranges covering `[0, file_size)`.
    pub fn split<R: Read + Seek>(
        &self,
        source: &mut R,
        file_size: u64,
    ) -> Result<Vec<ByteRange>, SplitError> {
        let chunk = file_size / self.parts as u64;
        let mut ranges = Vec::with_capacity(self.parts);
        let mut start = 0u64;

        for i in 0..self.parts {
            let end = if i + 1 == self.parts {
                file_size
            } else {
                let tentative = ((i as u64 + 1) * chunk).max(start);
                if tentative >= file_size {
                    file_size
                } else {
                    self.line_end_after(source, tentative, file_size)?
                }
            };

            ranges.push(ByteRange::new(start, end - start));
            start = end;
        }

        Ok(ranges)
    }

    /// Offset just past the first `\n` at or after `at`, or `file_size` when
    /// the file ends first.
    fn line_end_after<R: Read + Seek>(
        &self,
        source: &mut R,
        at: u64,
        file_size: u64,
    ) -> Result<u64, SplitError> {
        source
            .seek(SeekFrom::Start(at))
            .map_err(|source| SplitError::Io { offset: at, source })?;

        let mut window = self.lookahead.min(self.max_line_bytes);
        let mut scanned = 0usize;
        let mut buf = Vec::with_capacity(window);

        loop {
            buf.clear();
            let want = (window - scanned) as u64;
            let read = (&mut *source)
                .take(want)
                .read_to_end(&mut buf)
                .map_err(|source| SplitError::Io {
                    offset: at + scanned as u64,
                    source,
                })?;

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                return Ok(at + (scanned + pos) as u64 + 1);
            }
            scanned += read;

            if read == 0 || at + scanned as u64 >= file_size {
                return Ok(file_size);
            }
            if window >= self.max_line_bytes {
                return Err(SplitError::NoLineBoundary {
                    offset: at,
                    searched: scanned,
                });
            }

            window = window.saturating_mul(2).min(self.max_line_bytes);
            tracing::debug!(offset = at, window, "no line boundary in lookahead, widening");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn split(content: &[u8], parts: usize) -> Vec<ByteRange> {
        RangeSplitter::new(parts)
            .with_lookahead(8)
            .with_max_line_bytes(4096)
            .split(&mut Cursor::new(content), content.len() as u64)
            .unwrap()
    }

    fn lines(bytes: &[u8]) -> Vec<&[u8]> {
        bytes
            .split_inclusive(|&b| b == b'\n')
            .map(|l| l.strip_suffix(b"\n").unwrap_or(l))
            .collect()
    }

    fn assert_partition(ranges: &[ByteRange], size: u64) {
        let mut expected = 0;
        for range in ranges {
            assert_eq!(range.offset, expected, "gap or overlap in {:?}", ranges);
            expected = range.end();
        }
        assert_eq!(expected, size);
    }

    #[test]
    fn test_split_aligns_to_line_ends() {
        let content = b"aaaa\nbbbb\ncccc\ndddd\n";
        let ranges = split(content, 2);

        assert_eq!(ranges, vec![ByteRange::new(0, 15), ByteRange::new(15, 5)]);
        assert_partition(&ranges, content.len() as u64);
    }

    #[test]
    fn test_last_range_absorbs_remainder() {
        let content = b"a\nb\nc\nd\ne\nf\ng";
        let ranges = split(content, 3);

        assert_partition(&ranges, content.len() as u64);
        assert_eq!(ranges.last().unwrap().end(), content.len() as u64);
        for range in &ranges[..ranges.len() - 1] {
            assert_eq!(content[range.end() as usize - 1], b'\n');
        }
    }

    #[test]
    fn test_empty_file_yields_empty_ranges() {
        let ranges = split(b"", 4);
        assert_eq!(ranges.len(), 4);
        assert!(ranges.iter().all(|r| r.offset == 0 && r.is_empty()));
    }

    #[test]
    fn test_more_parts_than_lines() {
        let content = b"one\ntwo\n";
        let ranges = split(content, 6);

        assert_eq!(ranges.len(), 6);
        assert_partition(&ranges, content.len() as u64);
        assert!(ranges.iter().filter(|r| r.is_empty()).count() >= 4);
    }

    #[test]
    fn test_zero_parts_means_one() {
        let content = b"x\ny\n";
        let ranges = split(content, 0);
        assert_eq!(ranges, vec![ByteRange::new(0, 4)]);
    }

    #[test]
    fn test_lookahead_widens_for_long_lines() {
        let mut content = vec![b'x'; 600];
        content.push(b'\n');
        content.extend_from_slice(b"tail\n");

        let ranges = RangeSplitter::new(2)
            .with_lookahead(16)
            .with_max_line_bytes(1024)
            .split(&mut Cursor::new(&content), content.len() as u64)
            .unwrap();

        assert_eq!(ranges[0], ByteRange::new(0, 601));
        assert_eq!(ranges[1], ByteRange::new(601, 5));
    }

    #[test]
    fn test_fails_when_no_boundary_within_limit() {
        let mut content = vec![b'x'; 5000];
        content.push(b'\n');

        let err = RangeSplitter::new(4)
            .with_lookahead(16)
            .with_max_line_bytes(256)
            .split(&mut Cursor::new(&content), content.len() as u64)
            .unwrap_err();

        match err {
            SplitError::NoLineBoundary { offset, searched } => {
                assert_eq!(offset, 1250);
                assert_eq!(searched, 256);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_final_line_reaches_eof() {
        let content = b"first line\nsecond line without newline";
        let ranges = split(content, 2);

        assert_partition(&ranges, content.len() as u64);
        assert_eq!(ranges[0], ByteRange::new(0, content.len() as u64));
        assert!(ranges[1].is_empty());
    }

    proptest! {
        #[test]
        fn prop_ranges_partition_and_keep_lines_whole(
            raw_lines in proptest::collection::vec("[a-z{}:,\"0-9]{0,40}", 0..60),
            trailing_newline in any::<bool>(),
            parts in 1usize..12,
        ) {
            let mut content = raw_lines.join("\n").into_bytes();
            if trailing_newline && !content.is_empty() {
                content.push(b'\n');
            }

            let ranges = split(&content, parts);
            prop_assert_eq!(ranges.len(), parts);
            assert_partition(&ranges, content.len() as u64);

            let reassembled: Vec<&[u8]> = ranges
                .iter()
                .flat_map(|r| lines(&content[r.offset as usize..r.end() as usize]))
                .collect();
            prop_assert_eq!(reassembled, lines(&content));
        }
    }
}
