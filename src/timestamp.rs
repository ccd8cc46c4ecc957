use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Parse an RFC3339 timestamp straight from the raw line bytes.
pub fn parse_rfc3339(raw: &[u8]) -> Result<DateTime<FixedOffset>, TimestampError> {
    let text = std::str::from_utf8(raw).map_err(|_| TimestampError::NotUtf8)?;
    DateTime::parse_from_rfc3339(text).map_err(TimestampError::Invalid)
}

/// Format a timestamp the way the log writer emits it: `Z` for UTC, and only
/// as many fractional digits as are non-zero.
pub fn format_rfc3339(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp is not valid UTF-8")]
    NotUtf8,
    #[error("invalid RFC3339 timestamp: {0}")]
    Invalid(chrono::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Utc};
    use proptest::prelude::*;

    fn arb_utc_datetime() -> impl Strategy<Value = DateTime<FixedOffset>> {
        (0i64..=253402300799i64, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
            Utc.timestamp_opt(secs, nanos)
                .single()
                .expect("valid timestamp")
                .fixed_offset()
        })
    }

    #[test]
    fn test_parse_utc() {
        let ts = parse_rfc3339(b"2024-10-01T13:45:10Z").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 10);
        assert_eq!(ts.hour(), 13);
        assert_eq!(ts.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_keeps_offset_and_fraction() {
        let ts = parse_rfc3339(b"2024-10-02T01:00:00.5-05:30").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(ts.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_parse_rejects_non_rfc3339() {
        assert!(matches!(
            parse_rfc3339(b"2024-10-01 13:45"),
            Err(TimestampError::Invalid(_))
        ));
        assert!(matches!(
            parse_rfc3339(b"yesterday"),
            Err(TimestampError::Invalid(_))
        ));
        assert_eq!(parse_rfc3339(&[0xff, 0xfe]), Err(TimestampError::NotUtf8));
    }

    #[test]
    fn test_format_uses_z_for_utc() {
        let ts = parse_rfc3339(b"2024-10-01T00:00:00+00:00").unwrap();
        assert_eq!(format_rfc3339(&ts), "2024-10-01T00:00:00Z");
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_is_identity(dt in arb_utc_datetime()) {
            let text = format_rfc3339(&dt);
            let parsed = parse_rfc3339(text.as_bytes()).expect("formatted timestamp parses");
            prop_assert_eq!(parsed, dt);
        }
    }
}
