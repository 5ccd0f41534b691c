//! Configuration handling for pole-cli
//!
//! Settings live in a TOML file, `~/.config/pole-cli/config.toml` on Linux
//! (platform equivalent elsewhere), or wherever `--config` points.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Output format when `--format` is not given
    pub default_format: OutputFormat,

    /// Start sessions with the default utility pole
    pub seed_default_configuration: bool,

    /// Minimum time between attachment refresh passes, in milliseconds
    pub refresh_interval_ms: u64,

    /// tracing filter used when neither `--verbose` nor `RUST_LOG` is set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Text,
            seed_default_configuration: true,
            refresh_interval_ms: 100,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads from `path` when given, else the user config file if present,
    /// else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Returns the user config directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "pole", "pole-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Parses a config file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
