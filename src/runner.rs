//! Two-day analysis orchestration
//!
//! Reads the day 1 file, then the day 2 file, then runs the loyalty
//! aggregation, all under one cancellation context. Any failure along the
//! way discards everything; there is no partial report.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::AnalysisConfig;
use crate::entry::UserId;
use crate::loyalty::{Day, LoyaltyAggregator};
use crate::parallel::{FileRead, ParallelReader, ReadError};
use crate::platform::{CancelContext, Interrupted};
use crate::stats::AnalysisStats;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("error reading {day} log: {source}")]
    Read { day: Day, source: ReadError },

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl AnalysisError {
    /// The interruption behind this error, if the run was cancelled or timed out.
    pub fn interrupted(&self) -> Option<Interrupted> {
        match self {
            AnalysisError::Read { source, .. } => source.interrupted(),
            AnalysisError::Interrupted(i) => Some(*i),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.interrupted() == Some(Interrupted::DeadlineExceeded)
    }
}

/// Result of a completed analysis
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub loyal_users: Vec<UserId>,
    pub stats: AnalysisStats,
    pub elapsed: Duration,
}

impl AnalysisReport {
    /// Human-readable summary, one line per item.
    pub fn format_lines(&self) -> Vec<String> {
        let ids: Vec<String> = self.loyal_users.iter().map(|id| id.to_string()).collect();
        vec![
            format!("Loyal Customer Count: {}", self.loyal_users.len()),
            format!("Time elapsed: {:?}", self.elapsed),
            format!("Loyal Customer IDs: [{}]", ids.join(" ")),
        ]
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "count": self.loyal_users.len(),
            "elapsed_ms": self.elapsed.as_micros() as f64 / 1000.0,
            "loyal_users": self.loyal_users,
        })
    }
}

pub struct Analyzer {
    config: AnalysisConfig,
    reader: ParallelReader,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let reader = ParallelReader::new(config.reader.clone());
        Self { config, reader }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// A fresh context carrying the configured deadline, starting now.
    pub fn context(&self) -> CancelContext {
        match self.config.timeout {
            Some(timeout) => CancelContext::with_timeout(timeout),
            None => CancelContext::new(),
        }
    }

    pub fn run(
        &self,
        day1: &Path,
        day2: &Path,
        ctx: &CancelContext,
    ) -> Result<AnalysisReport, AnalysisError> {
        let start = Instant::now();

        let first = self.read_day(Day::First, day1, ctx)?;
        ctx.check()?;
        let second = self.read_day(Day::Second, day2, ctx)?;
        let read_time = start.elapsed();

        let aggregate_start = Instant::now();
        let mut aggregator = LoyaltyAggregator::new(self.config.min_pages);
        aggregator.observe(Day::First, &first.entries, ctx)?;
        aggregator.observe(Day::Second, &second.entries, ctx)?;
        ctx.check()?;
        let loyal_users = aggregator.loyal_users();

        let stats = AnalysisStats {
            day1: first.stats,
            day2: second.stats,
            users_tracked: aggregator.user_count(),
            loyal_users: loyal_users.len(),
            read_time,
            aggregate_time: aggregate_start.elapsed(),
        };
        let elapsed = start.elapsed();

        tracing::info!(
            loyal = loyal_users.len(),
            users = stats.users_tracked,
            elapsed_ms = elapsed.as_millis() as u64,
            "analysis complete"
        );

        Ok(AnalysisReport {
            loyal_users,
            stats,
            elapsed,
        })
    }

    fn read_day(
        &self,
        day: Day,
        path: &Path,
        ctx: &CancelContext,
    ) -> Result<FileRead, AnalysisError> {
        tracing::info!(%day, path = %path.display(), "reading log");
        let read = self
            .reader
            .read_file(path, ctx)
            .map_err(|source| AnalysisError::Read { day, source })?;

        if read.stats.lines_skipped > 0 {
            tracing::warn!(
                %day,
                skipped = read.stats.lines_skipped,
                "skipped malformed lines"
            );
        }
        Ok(read)
    }
}

/// Run a full analysis of two daily logs with `config`.
pub fn analyze(
    day1: impl AsRef<Path>,
    day2: impl AsRef<Path>,
    config: &AnalysisConfig,
    ctx: &CancelContext,
) -> Result<AnalysisReport, AnalysisError> {
    Analyzer::new(config.clone()).run(day1.as_ref(), day2.as_ref(), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file(records: &[(i64, &str)]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        for (user, page) in records {
            writeln!(
                file,
                r#"{{"userId":{},"pageName":"{}","timestamp":"2024-10-01T09:00:00Z"}}"#,
                user, page
            )
            .unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_analyze_two_files() {
        let day1 = log_file(&[(1, "blog"), (1, "dashboard"), (1, "shop"), (2, "blog")]);
        let day2 = log_file(&[(1, "about"), (2, "shop")]);

        let report = analyze(
            day1.path(),
            day2.path(),
            &AnalysisConfig::default(),
            &CancelContext::new(),
        )
        .unwrap();

        assert_eq!(report.loyal_users, vec![1]);
        assert_eq!(report.stats.users_tracked, 2);
        assert_eq!(report.stats.day1.entries, 4);
        assert_eq!(report.stats.day2.entries, 2);
    }

    #[test]
    fn test_missing_second_file_fails_whole_run() {
        let day1 = log_file(&[(1, "blog")]);
        let err = analyze(
            day1.path(),
            "/no/such/day2.log",
            &AnalysisConfig::default(),
            &CancelContext::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Read {
                day: Day::Second,
                source: ReadError::Open { .. }
            }
        ));
        assert_eq!(err.interrupted(), None);
    }

    #[test]
    fn test_expired_deadline_reports_timeout() {
        let day1 = log_file(&[(1, "blog")]);
        let day2 = log_file(&[(1, "shop")]);
        let ctx = CancelContext::with_deadline(Instant::now());

        let err = analyze(day1.path(), day2.path(), &AnalysisConfig::default(), &ctx).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_report_formats() {
        let report = AnalysisReport {
            loyal_users: vec![1, 3],
            stats: AnalysisStats::default(),
            elapsed: Duration::from_millis(12),
        };

        let lines = report.format_lines();
        assert_eq!(lines[0], "Loyal Customer Count: 2");
        assert_eq!(lines[1], "Time elapsed: 12ms");
        assert_eq!(lines[2], "Loyal Customer IDs: [1 3]");

        let json = report.to_json();
        assert_eq!(json["count"], 2);
        assert_eq!(json["loyal_users"], serde_json::json!([1, 3]));
        assert_eq!(json["elapsed_ms"], 12.0);
    }

    #[test]
    fn test_context_follows_config_timeout() {
        let analyzer = Analyzer::new(AnalysisConfig {
            timeout: None,
            ..AnalysisConfig::default()
        });
        assert!(analyzer.context().deadline().is_none());

        let analyzer = Analyzer::new(AnalysisConfig::default());
        assert!(analyzer.context().deadline().is_some());
    }
}
