use super::{EntryParser, ParseError, MIN_RECORD_LEN};
use crate::entry::LogEntry;

/// Generic decoder backed by serde_json. Slower than the byte scanner, but
/// accepts any field order and decodes string escapes.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEntryParser;

impl JsonEntryParser {
    pub fn new() -> Self {
        Self
    }
}

impl EntryParser for JsonEntryParser {
    fn parse(&self, line: &[u8]) -> Result<LogEntry, ParseError> {
        let line = line.trim_ascii();
        if line.len() < MIN_RECORD_LEN {
            return Err(ParseError::TooShort { len: line.len() });
        }

        serde_json::from_slice(line).map_err(|e| ParseError::Json(e.to_string()))
    }
}
