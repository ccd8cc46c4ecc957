use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, Settings};

const PROJECT_CONFIG_NAME: &str = ".loyaltyrc";

/// Configuration file handler
///
/// Files are INI-style:
///
/// ```ini
/// # defaults for `loyalty analyze`
/// [analyze]
/// workers = 8
/// min-pages = 4
/// timeout = 2s
/// parser = fast
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub analyze: Settings,
    /// Files that contributed, lowest precedence first.
    pub sources: Vec<PathBuf>,
}

impl ConfigFile {
    /// Find project-level .loyaltyrc by walking up directory tree
    pub fn find_project_config() -> Option<PathBuf> {
        let current = env::current_dir().ok()?;
        Self::find_project_config_from(&current)
    }

    fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let config_path = current.join(PROJECT_CONFIG_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !current.pop() {
                // Reached filesystem root
                return None;
            }
        }
    }

    /// Get list of user config file locations in order of preference
    pub fn get_user_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if cfg!(windows) {
            if let Ok(appdata) = env::var("APPDATA") {
                paths.push(PathBuf::from(appdata).join("loyalty").join("config.ini"));
            }
            if let Ok(userprofile) = env::var("USERPROFILE") {
                paths.push(PathBuf::from(userprofile).join(PROJECT_CONFIG_NAME));
            }
        } else {
            // 1. $XDG_CONFIG_HOME/loyalty/config.ini
            // 2. ~/.config/loyalty/config.ini (XDG fallback)
            // 3. ~/.loyaltyrc
            let xdg_config = env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    env::var("HOME")
                        .map(|h| PathBuf::from(h).join(".config"))
                        .unwrap_or_else(|_| PathBuf::from(".config"))
                });

            paths.push(xdg_config.join("loyalty").join("config.ini"));

            if let Ok(home) = env::var("HOME") {
                paths.push(PathBuf::from(home).join(PROJECT_CONFIG_NAME));
            }
        }

        paths
    }

    /// Load configuration with proper precedence: project > user > defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // First existing user config file only
        if let Some(path) = Self::get_user_config_paths()
            .into_iter()
            .find(|p| p.is_file())
        {
            config = config.merge(Self::load_from_path(&path)?);
        }

        if let Some(project_path) = Self::find_project_config() {
            config = config.merge(Self::load_from_path(&project_path)?);
        }

        Ok(config)
    }

    /// Load configuration with optional custom config file path
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse_ini_content(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.sources.push(path.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse INI content from string
    pub fn parse_ini_content(content: &str) -> Result<Self, ConfigError> {
        let mut analyze = Settings::default();
        let mut current_section = String::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Invalid(format!(
                    "line {}: expected key = value, got '{}'",
                    number + 1,
                    line
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match current_section.as_str() {
                "analyze" => analyze.set(key, value)?,
                section => {
                    return Err(ConfigError::UnknownKey {
                        section: section.to_string(),
                        key: key.to_string(),
                    })
                }
            }
        }

        Ok(Self {
            analyze,
            sources: Vec::new(),
        })
    }

    /// Merge two configuration objects, with the second taking precedence
    fn merge(self, overlay: Self) -> Self {
        let mut sources = self.sources;
        sources.extend(overlay.sources);
        Self {
            analyze: self.analyze.merge(overlay.analyze),
            sources,
        }
    }
}
