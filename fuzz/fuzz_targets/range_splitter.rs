#![no_main]

use libfuzzer_sys::fuzz_target;
use loyalty::RangeSplitter;
use std::io::Cursor;

fuzz_target!(|input: (u8, u8, &[u8])| {
    let (parts, lookahead, data) = input;
    let splitter = RangeSplitter::new(usize::from(parts % 16) + 1)
        .with_lookahead(usize::from(lookahead) + 1)
        .with_max_line_bytes(data.len().max(usize::from(lookahead) + 1));

    if let Ok(ranges) = splitter.split(&mut Cursor::new(data), data.len() as u64) {
        let mut next = 0;
        for range in &ranges {
            assert_eq!(range.offset, next);
            next = range.end();
        }
        assert_eq!(next, data.len() as u64);
    }
});
