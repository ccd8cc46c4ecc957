//! Byte-scanning decoder for the fixed activity record shape:
//!
//! ```text
//! {"userId":1234,"pageName":"blog","timestamp":"2024-10-01T08:30:00Z"}
//! ```
//!
//! Fields must appear in this order. ASCII whitespace is allowed between
//! tokens. Page names are taken verbatim, so escape sequences are rejected
//! rather than decoded; use the JSON parser for such input.

use super::{EntryParser, ParseError, MIN_RECORD_LEN};
use crate::entry::LogEntry;
use crate::timestamp::parse_rfc3339;

#[derive(Debug, Default, Clone, Copy)]
pub struct FastEntryParser;

impl FastEntryParser {
    pub fn new() -> Self {
        Self
    }
}

impl EntryParser for FastEntryParser {
    fn parse(&self, line: &[u8]) -> Result<LogEntry, ParseError> {
        let line = line.trim_ascii_end();
        if line.len() < MIN_RECORD_LEN {
            return Err(ParseError::TooShort { len: line.len() });
        }

        let mut cursor = Cursor::new(line);
        cursor.expect(b'{')?;

        cursor.key("userId")?;
        let user_id = cursor.integer()?;
        cursor.expect(b',')?;

        cursor.key("pageName")?;
        let page_name = cursor.string("pageName")?;
        cursor.expect(b',')?;

        cursor.key("timestamp")?;
        let timestamp = cursor.string("timestamp")?;
        cursor.expect(b'}')?;
        cursor.finish()?;

        let page_name = std::str::from_utf8(page_name)
            .map_err(|_| ParseError::InvalidPageName("not valid UTF-8"))?;

        Ok(LogEntry {
            user_id,
            page_name: page_name.to_owned(),
            timestamp: parse_rfc3339(timestamp)?,
        })
    }
}

struct Cursor<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a [u8]) -> Self {
        Self { line, pos: 0 }
    }

    fn skip_ws(&mut self) {
        while self
            .line
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        self.skip_ws();
        if self.line.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ParseError::MissingDelimiter {
                expected: byte as char,
                at: self.pos,
            })
        }
    }

    /// Consume `"name"` followed by `:`.
    fn key(&mut self, name: &'static str) -> Result<(), ParseError> {
        self.skip_ws();
        let rest = &self.line[self.pos..];
        let matches = rest.len() > name.len() + 1
            && rest[0] == b'"'
            && &rest[1..=name.len()] == name.as_bytes()
            && rest[name.len() + 1] == b'"';
        if !matches {
            return Err(ParseError::MissingField(name));
        }
        self.pos += name.len() + 2;
        self.expect(b':')
    }

    /// Consume a bare integer token and parse it as i64.
    fn integer(&mut self) -> Result<i64, ParseError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .line
            .get(self.pos)
            .is_some_and(|b| !matches!(b, b',' | b'}') && !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        let token = &self.line[start..self.pos];
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ParseError::InvalidUserId(String::from_utf8_lossy(token).into_owned()))
    }

    /// Consume a quoted string and return its raw contents.
    fn string(&mut self, field: &'static str) -> Result<&'a [u8], ParseError> {
        self.expect(b'"')?;
        let start = self.pos;
        let len = self.line[start..]
            .iter()
            .position(|&b| b == b'"')
            .ok_or(ParseError::MissingDelimiter {
                expected: '"',
                at: self.line.len(),
            })?;
        let value = &self.line[start..start + len];
        if value.contains(&b'\\') {
            return Err(match field {
                "pageName" => ParseError::InvalidPageName("escape sequences are not supported"),
                _ => ParseError::MissingField(field),
            });
        }
        self.pos = start + len + 1;
        Ok(value)
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        if self.pos == self.line.len() {
            Ok(())
        } else {
            Err(ParseError::TrailingData { at: self.pos })
        }
    }
}
