use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Identifier carried in the `userId` field of every record.
pub type UserId = i64;

/// One parsed activity record.
///
/// The serde shape matches the on-disk line format, so the same type backs the
/// generic JSON decoder and the synthetic data writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "pageName")]
    pub page_name: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl LogEntry {
    pub fn new(
        user_id: UserId,
        page_name: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            user_id,
            page_name: page_name.into(),
            timestamp,
        }
    }

    /// Render the entry as a single log line, without the trailing newline.
    /// The page name is JSON-escaped; the timestamp keeps a `Z` suffix for UTC.
    pub fn to_line(&self) -> String {
        format!(
            r#"{{"userId":{},"pageName":{},"timestamp":"{}"}}"#,
            self.user_id,
            serde_json::Value::from(self.page_name.as_str()),
            crate::timestamp::format_rfc3339(&self.timestamp)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_line_matches_serde_shape() {
        let ts = DateTime::parse_from_rfc3339("2024-10-01T08:30:00Z").unwrap();
        let entry = LogEntry::new(42, "blog", ts);

        let line = entry.to_line();
        assert_eq!(
            line,
            r#"{"userId":42,"pageName":"blog","timestamp":"2024-10-01T08:30:00Z"}"#
        );

        let decoded: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_to_line_keeps_offset() {
        let ts = DateTime::parse_from_rfc3339("2024-10-01T08:30:00.250+02:00").unwrap();
        let entry = LogEntry::new(-7, "shop", ts);

        assert_eq!(
            entry.to_line(),
            r#"{"userId":-7,"pageName":"shop","timestamp":"2024-10-01T08:30:00.250+02:00"}"#
        );
    }

    #[test]
    fn test_to_line_escapes_page_name() {
        let ts = DateTime::parse_from_rfc3339("2024-10-01T08:30:00Z").unwrap();
        let entry = LogEntry::new(3, r#"say "hi" \ bye"#, ts);

        let line = entry.to_line();
        assert_eq!(
            line,
            r#"{"userId":3,"pageName":"say \"hi\" \\ bye","timestamp":"2024-10-01T08:30:00Z"}"#
        );

        let decoded: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, entry);
    }
}
