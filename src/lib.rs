// Core library for the loyalty log analyzer
//
// Two daily activity logs go in, the ids of users who came back on both
// days and browsed enough distinct pages come out. Files are split into
// line-aligned byte ranges and parsed on worker threads; everything runs
// under one cancellation context with an optional deadline.

pub use config::{AnalysisConfig, ConfigError, Settings};
pub use entry::{LogEntry, UserId};
pub use loyalty::{identify_loyal_users, Day, LoyaltyAggregator, DEFAULT_MIN_PAGES};
pub use parallel::{
    read_file, ByteRange, FileRead, ParallelReader, RangeSplitter, ReadError, ReaderConfig,
    SplitError,
};
pub use parsers::{EntryParser, FastEntryParser, JsonEntryParser, ParseError, ParserKind};
pub use platform::{CancelContext, ExitCode, Interrupted};
pub use runner::{analyze, AnalysisError, AnalysisReport, Analyzer};
pub use stats::{AnalysisStats, ReadStats};

pub mod cli;
pub mod config;
pub mod config_file;
pub mod entry;
pub mod generator;
pub mod logging;
pub mod loyalty;
pub mod parallel;
pub mod parsers;
pub mod platform;
pub mod runner;
pub mod stats;
pub mod timestamp;
