//! Process-wide file logging for counters diagnostics.
//!
//! # Responsibility
//! - Start the rolling `edutrack` file logger from validated `LogSettings`.
//! - Capture panics as `panic_captured` events before the default hook runs.
//!
//! # Invariants
//! - The logger starts at most once per process; a repeat call with equal
//!   settings succeeds, any other settings are rejected.
//! - Log files roll daily or at `MAX_LOG_FILE_BYTES`, whichever comes first.
//! - Events are metadata-only; user ids and counter payloads are not logged.

use crate::config::LogSettings;
use flexi_logger::{
    Age, Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "edutrack";
const MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 14;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    /// Logging already runs with different settings.
    AlreadyActive {
        active: LogSettings,
        requested: LogSettings,
    },
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active with level `{}` at `{}`; refusing level `{}` at `{}`",
                active.level,
                active.dir.display(),
                requested.level,
                requested.dir.display()
            ),
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyActive { .. } => None,
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Starts file logging with `settings`, or confirms it already runs with them.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(settings))?;
    if active.settings != *settings {
        return Err(LoggingError::AlreadyActive {
            active: active.settings.clone(),
            requested: settings.clone(),
        });
    }
    Ok(())
}

fn start_logger(settings: &LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(settings.level)?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::AgeOrSize(Age::Day, MAX_LOG_FILE_BYTES),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(KEPT_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    capture_panics();
    info!(
        "event=logging_start module=core status=ok level={} build_mode={} version={}",
        settings.level,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

/// Chains a logging hook in front of the existing panic hook.
///
/// Only called from `start_logger`, which `OnceCell` runs once.
fn capture_panics() {
    let next_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            single_line(payload, PANIC_PAYLOAD_LIMIT)
        );
        next_hook(info);
    }));
}

/// Flattens line breaks and caps length so one event stays one log line.
fn single_line(value: &str, limit: usize) -> String {
    let mut line: String = value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .take(limit)
        .collect();
    if value.chars().count() > limit {
        line.push_str("...");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{init_logging, single_line, LoggingError};
    use crate::config::LogSettings;

    #[test]
    fn single_line_flattens_and_caps() {
        let line = single_line("line1\nline2\rline3", 8);
        assert_eq!(line, "line1 li...");
        assert_eq!(single_line("short", 8), "short");
    }

    #[test]
    fn init_is_repeatable_with_same_settings_and_rejects_others() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = LogSettings {
            level: "info",
            dir: dir.path().to_path_buf(),
        };

        init_logging(&settings).expect("first init should succeed");
        init_logging(&settings).expect("same settings should be accepted");

        let louder = LogSettings {
            level: "debug",
            ..settings.clone()
        };
        let err = init_logging(&louder).expect_err("level change must be rejected");
        assert!(matches!(err, LoggingError::AlreadyActive { .. }));
        assert!(err.to_string().contains("refusing level `debug`"));

        let other_dir = tempfile::tempdir().expect("temp dir");
        let moved = LogSettings {
            dir: other_dir.path().to_path_buf(),
            ..settings.clone()
        };
        assert!(matches!(
            init_logging(&moved),
            Err(LoggingError::AlreadyActive { active, .. }) if active == settings
        ));
    }
}
