use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DeckError, Result};

/// Default directory holding the card images.
pub const DEFAULT_IMAGES_DIR: &str = "PNG-cards-1.3";

/// Default number of blobs transferred concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Deckpack configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckpackConfig {
    /// Directory containing `<rank>_of_<suit>.png` images
    pub images_dir: PathBuf,

    /// Talk to registries over plain HTTP instead of HTTPS
    pub plain_http: bool,

    /// Maximum number of blobs copied at once
    pub concurrency: usize,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for DeckpackConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            plain_http: false,
            concurrency: DEFAULT_CONCURRENCY,
            log_level: LogLevel::Warn,
        }
    }
}

impl DeckpackConfig {
    /// Load configuration.
    ///
    /// Starts from defaults, merges the YAML file at `path` (or
    /// `~/.deckpack/config.yaml` when `path` is `None` and that file
    /// exists), then applies `DECKPACK_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeckError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            DeckError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Apply overrides from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DECKPACK_IMAGES_DIR") {
            self.images_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("DECKPACK_PLAIN_HTTP") {
            self.plain_http = parse_bool(&value).ok_or_else(|| {
                DeckError::ConfigError(format!("DECKPACK_PLAIN_HTTP: invalid boolean '{}'", value))
            })?;
        }
        if let Some(value) = lookup("DECKPACK_CONCURRENCY") {
            self.concurrency = value.trim().parse().map_err(|_| {
                DeckError::ConfigError(format!("DECKPACK_CONCURRENCY: invalid number '{}'", value))
            })?;
        }
        if let Some(value) = lookup("DECKPACK_LOG_LEVEL") {
            self.log_level = value
                .parse()
                .map_err(|e| DeckError::ConfigError(format!("DECKPACK_LOG_LEVEL: {}", e)))?;
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(DeckError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Path of the per-user config file (`~/.deckpack/config.yaml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".deckpack").join("config.yaml"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level: '{}' (supported: debug, info, warn, error)",
                other
            )),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
