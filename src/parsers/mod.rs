pub mod fast;
pub mod json;

pub use fast::FastEntryParser;
pub use json::JsonEntryParser;

use crate::entry::LogEntry;
use crate::timestamp::TimestampError;

/// Shortest line that could still hold all three fields.
pub const MIN_RECORD_LEN: usize = 20;

/// Decodes one raw log line (without its terminator) into an entry.
///
/// A parse failure is a data-quality problem, not a fault: callers skip the
/// line and keep reading.
pub trait EntryParser: Send + Sync {
    fn parse(&self, line: &[u8]) -> Result<LogEntry, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line too short ({len} bytes)")]
    TooShort { len: usize },
    #[error("expected '{expected}' at byte {at}")]
    MissingDelimiter { expected: char, at: usize },
    #[error("missing field \"{0}\"")]
    MissingField(&'static str),
    #[error("invalid userId: {0}")]
    InvalidUserId(String),
    #[error("invalid pageName: {0}")]
    InvalidPageName(&'static str),
    #[error(transparent)]
    InvalidTimestamp(#[from] TimestampError),
    #[error("trailing data after record at byte {at}")]
    TrailingData { at: usize },
    #[error("malformed JSON record: {0}")]
    Json(String),
}

/// Which line decoder the reader uses.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserKind {
    /// Byte-position scanner for the fixed record shape
    #[default]
    Fast,
    /// Generic serde_json decoding, tolerant of field order
    Json,
}

impl ParserKind {
    pub fn build(self) -> Box<dyn EntryParser> {
        match self {
            ParserKind::Fast => Box::new(FastEntryParser::new()),
            ParserKind::Json => Box::new(JsonEntryParser::new()),
        }
    }
}

impl std::str::FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(ParserKind::Fast),
            "json" => Ok(ParserKind::Json),
            other => Err(format!("unknown parser '{}': expected fast or json", other)),
        }
    }
}
