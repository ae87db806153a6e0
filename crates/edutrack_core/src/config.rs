//! Runtime configuration for core consumers.
//!
//! # Responsibility
//! - Resolve database path and logging settings from the environment.
//! - Validate log level and directory before logging is started.
//!
//! # Invariants
//! - Unset or blank variables use defaults; malformed values are errors.
//! - Loading never mutates process state.
//! - File logging is enabled only when a log directory is configured.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "EDUTRACK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "EDUTRACK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "EDUTRACK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "edutrack_counters.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid {key}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Validated file-logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// One of `trace|debug|info|warn|error`.
    pub level: &'static str,
    /// Absolute directory receiving the rolling `edutrack` log files.
    pub dir: PathBuf,
}

impl LogSettings {
    /// Validates a raw level/directory pair, e.g. from an RPC init call.
    pub fn parse(level: &str, dir: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            level: parse_level(level)?,
            dir: parse_log_dir(dir)?,
        })
    }
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Settings shared by the RPC layer and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// `None` disables file logging.
    pub log: Option<LogSettings>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match non_blank(lookup(DB_PATH_ENV)) {
            Some(raw) => config.db_path = PathBuf::from(raw),
            None => info!(
                "event=config_default module=config key={} value={}",
                DB_PATH_ENV,
                config.db_path.display()
            ),
        }

        // A level without a directory is still validated so typos surface early.
        let level = match non_blank(lookup(LOG_LEVEL_ENV)) {
            Some(raw) => parse_level(&raw)?,
            None => default_log_level(),
        };

        if let Some(raw) = non_blank(lookup(LOG_DIR_ENV)) {
            config.log = Some(LogSettings {
                level,
                dir: parse_log_dir(&raw)?,
            });
        }

        Ok(config)
    }
}

fn parse_level(raw: &str) -> Result<&'static str, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ConfigError::InvalidValue {
            key: LOG_LEVEL_ENV,
            message: format!("unsupported log level `{other}`; expected trace|debug|info|warn|error"),
        }),
    }
}

fn parse_log_dir(raw: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: LOG_DIR_ENV,
            message: "log directory cannot be empty".to_string(),
        });
    }
    let dir = PathBuf::from(trimmed);
    if !dir.is_absolute() {
        return Err(ConfigError::InvalidValue {
            key: LOG_DIR_ENV,
            message: format!("must be an absolute path, got `{trimmed}`"),
        });
    }
    Ok(dir)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
