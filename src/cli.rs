// CLI-specific types and structures

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{parse_timeout, Settings};
use crate::generator::GeneratorConfig;
use crate::parsers::ParserKind;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Default,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "loyalty")]
#[command(about = "Find users who came back on both days and browsed enough distinct pages")]
#[command(
    long_about = "Find users who came back on both days and browsed enough distinct pages\n\nEach input file holds one JSON record per line:\n  {\"userId\":1,\"pageName\":\"blog\",\"timestamp\":\"2024-10-01T09:00:00Z\"}\n\nCOMMON EXAMPLES:\n  loyalty generate --out-dir logs --seed 7\n  loyalty analyze logs/logs_2024-10-01.log logs/logs_2024-10-02.log\n  loyalty analyze day1.log day2.log --workers 8 --timeout 5s -F json"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). LOYALTY_LOG overrides this
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report loyal users across two daily log files
    Analyze(AnalyzeArgs),
    /// Write two synthetic daily log files
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file for the first day
    pub day1: PathBuf,

    /// Log file for the second day
    pub day2: PathBuf,

    /// Worker threads per file (0 = one per CPU)
    #[arg(long = "workers", alias = "threads", help_heading = "Processing Options")]
    pub workers: Option<usize>,

    /// Distinct pages a user must visit across both days
    #[arg(long = "min-pages", help_heading = "Processing Options")]
    pub min_pages: Option<usize>,

    /// Deadline for the whole run, e.g. 500ms or 2s (0 or none disables it)
    #[arg(long = "timeout", value_parser = parse_timeout, help_heading = "Processing Options")]
    pub timeout: Option<Duration>,

    /// Record parser
    #[arg(long = "parser", value_enum, help_heading = "Processing Options")]
    pub parser: Option<ParserKind>,

    /// Initial window used to find a line boundary when splitting a file
    #[arg(long = "lookahead", help_heading = "Processing Options")]
    pub lookahead_bytes: Option<usize>,

    /// Longest line accepted before the file is rejected
    #[arg(long = "max-line-bytes", help_heading = "Processing Options")]
    pub max_line_bytes: Option<usize>,

    /// Output format
    #[arg(
        short = 'F',
        long = "output-format",
        value_enum,
        default_value_t = OutputFormat::Default,
        help_heading = "Output Options"
    )]
    pub output_format: OutputFormat,

    /// Print read and aggregation statistics to stderr
    #[arg(short = 's', long = "stats", help_heading = "Output Options")]
    pub stats: bool,

    /// Read settings from this file instead of the user and project config
    #[arg(long = "config-file", help_heading = "Configuration Options")]
    pub config_file: Option<PathBuf>,

    /// Ignore all config files
    #[arg(long = "ignore-config", help_heading = "Configuration Options")]
    pub ignore_config: bool,
}

impl AnalyzeArgs {
    /// Settings given on the command line; they override every config file.
    pub fn to_settings(&self) -> Settings {
        Settings {
            workers: self.workers,
            min_pages: self.min_pages,
            timeout: self.timeout,
            parser: self.parser,
            lookahead_bytes: self.lookahead_bytes,
            max_line_bytes: self.max_line_bytes,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory for the generated files
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,

    /// Size of the user id pool
    #[arg(long = "users", default_value_t = 10_000)]
    pub users: u64,

    /// Records per file
    #[arg(long = "entries", default_value_t = 10_000)]
    pub entries: usize,

    /// Share of users planted as loyal
    #[arg(long = "loyal-rate", default_value_t = 0.18)]
    pub loyal_rate: f64,

    /// Distinct pages each planted user visits per day, at least
    #[arg(long = "min-pages", default_value_t = crate::loyalty::DEFAULT_MIN_PAGES)]
    pub min_pages: usize,

    /// Date of the first file (YYYY-MM-DD)
    #[arg(long = "start-date")]
    pub start_date: Option<NaiveDate>,

    /// Seed for reproducible output
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

impl GenerateArgs {
    pub fn to_config(&self) -> GeneratorConfig {
        let defaults = GeneratorConfig::default();
        GeneratorConfig {
            users: self.users,
            entries_per_day: self.entries,
            loyal_rate: self.loyal_rate,
            min_pages: self.min_pages,
            start_date: self.start_date.unwrap_or(defaults.start_date),
            seed: self.seed,
        }
    }
}
