use std::time::Duration;

/// Counters collected while reading one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub ranges: usize,
    pub bytes: u64,
    pub lines_read: usize,
    /// Non-empty lines the parser rejected.
    pub lines_skipped: usize,
    /// Blank lines, ignored without counting as malformed.
    pub lines_blank: usize,
    pub entries: usize,
}

impl ReadStats {
    /// Fold another range's counters into this one.
    pub fn merge(&mut self, other: &ReadStats) {
        self.ranges += other.ranges;
        self.bytes += other.bytes;
        self.lines_read += other.lines_read;
        self.lines_skipped += other.lines_skipped;
        self.lines_blank += other.lines_blank;
        self.entries += other.entries;
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Lines processed: {} total, {} entries, {} skipped",
            self.lines_read, self.entries, self.lines_skipped
        );

        if self.lines_blank > 0 {
            output.push_str(&format!(", {} blank", self.lines_blank));
        }

        output.push_str(&format!(
            "; {} bytes in {} ranges",
            self.bytes, self.ranges
        ));
        output
    }
}

/// Counters for a whole two-day analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisStats {
    pub day1: ReadStats,
    pub day2: ReadStats,
    pub users_tracked: usize,
    pub loyal_users: usize,
    pub read_time: Duration,
    pub aggregate_time: Duration,
}

impl AnalysisStats {
    pub fn format_stats(&self) -> String {
        format!(
            "Day 1: {}\nDay 2: {}\nUsers tracked: {}, loyal: {}\nRead time: {}ms, aggregate time: {}ms",
            self.day1.format_stats(),
            self.day2.format_stats(),
            self.users_tracked,
            self.loyal_users,
            self.read_time.as_millis(),
            self.aggregate_time.as_millis()
        )
    }
}
