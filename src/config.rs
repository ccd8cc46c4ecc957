use std::time::Duration;

use crate::loyalty::DEFAULT_MIN_PAGES;
use crate::parallel::ReaderConfig;
use crate::parsers::ParserKind;

/// Deadline applied to a whole analysis when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Main configuration struct for an analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub reader: ReaderConfig,
    pub min_pages: usize,
    /// Overall deadline; `None` runs without one.
    pub timeout: Option<Duration>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            min_pages: DEFAULT_MIN_PAGES,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown setting '{key}' in [{section}]")]
    UnknownKey { section: String, key: String },

    #[error("{0}")]
    Invalid(String),
}

/// Partial settings from one source (config file or command line).
/// Unset fields leave the lower-precedence value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub workers: Option<usize>,
    pub min_pages: Option<usize>,
    pub timeout: Option<Duration>,
    pub parser: Option<ParserKind>,
    pub lookahead_bytes: Option<usize>,
    pub max_line_bytes: Option<usize>,
}

impl Settings {
    /// Parse a single `key = value` pair as written in a config file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match key {
            "workers" | "threads" => {
                self.workers = Some(value.parse().map_err(|e| invalid(format!("{}", e)))?)
            }
            "min-pages" | "min_pages" => {
                self.min_pages = Some(value.parse().map_err(|e| invalid(format!("{}", e)))?)
            }
            "timeout" => self.timeout = Some(parse_timeout(value).map_err(invalid)?),
            "parser" => self.parser = Some(value.parse().map_err(invalid)?),
            "lookahead" | "lookahead-bytes" => {
                self.lookahead_bytes =
                    Some(value.parse().map_err(|e| invalid(format!("{}", e)))?)
            }
            "max-line-bytes" | "max_line_bytes" => {
                self.max_line_bytes = Some(value.parse().map_err(|e| invalid(format!("{}", e)))?)
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    section: "analyze".to_string(),
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Layer `overlay` on top of `self`.
    pub fn merge(self, overlay: Settings) -> Settings {
        Settings {
            workers: overlay.workers.or(self.workers),
            min_pages: overlay.min_pages.or(self.min_pages),
            timeout: overlay.timeout.or(self.timeout),
            parser: overlay.parser.or(self.parser),
            lookahead_bytes: overlay.lookahead_bytes.or(self.lookahead_bytes),
            max_line_bytes: overlay.max_line_bytes.or(self.max_line_bytes),
        }
    }

    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(workers) = self.workers {
            config.reader.workers = workers;
        }
        if let Some(min_pages) = self.min_pages {
            config.min_pages = min_pages;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = (!timeout.is_zero()).then_some(timeout);
        }
        if let Some(parser) = self.parser {
            config.reader.parser = parser;
        }
        if let Some(lookahead) = self.lookahead_bytes {
            config.reader.lookahead_bytes = lookahead;
        }
        if let Some(max_line_bytes) = self.max_line_bytes {
            config.reader.max_line_bytes = max_line_bytes;
        }
    }
}

/// Parse a human-readable duration; `0`, `none` and `off` disable the deadline.
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    match value.trim() {
        "0" | "none" | "off" => Ok(Duration::ZERO),
        other => humantime::parse_duration(other).map_err(|e| e.to_string()),
    }
}

impl AnalysisConfig {
    /// Build a config from defaults plus settings in increasing precedence.
    pub fn from_settings(layers: &[Settings]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for layer in layers {
            layer.apply(&mut config);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_pages == 0 {
            return Err(ConfigError::Invalid(
                "min-pages must be at least 1".to_string(),
            ));
        }
        if self.reader.lookahead_bytes == 0 {
            return Err(ConfigError::Invalid(
                "lookahead must be at least 1 byte".to_string(),
            ));
        }
        if self.reader.max_line_bytes < self.reader.lookahead_bytes {
            return Err(ConfigError::Invalid(format!(
                "max-line-bytes ({}) must not be smaller than lookahead ({})",
                self.reader.max_line_bytes, self.reader.lookahead_bytes
            )));
        }
        Ok(())
    }
}
