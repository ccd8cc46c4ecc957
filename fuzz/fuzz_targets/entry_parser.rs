#![no_main]

use libfuzzer_sys::fuzz_target;
use loyalty::{EntryParser, FastEntryParser, JsonEntryParser};

fuzz_target!(|data: &[u8]| {
    // Rejections are fine; we only care about panics.
    let _ = FastEntryParser::new().parse(data);
    let _ = JsonEntryParser::new().parse(data);
});
