//! Use-case API for dashboard RPC calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the web RPC router.
//! - Gate every counters call on an authenticated session.
//! - Keep error semantics simple: an envelope with `ok` and a message.
//!
//! # Invariants
//! - Exported functions never panic.
//! - A request returns a complete payload or fails as a whole.
//! - Stats payloads carry every `DailyCounters` field plus `dateLabel`.

use edutrack_core::db::open_db;
use edutrack_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, CountersService, LogSettings, RepoResult, SqliteCountersRepository,
    StatsSnapshot, SystemClock, UserId,
};
use log::warn;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;

const HISTORY_DEFAULT_LIMIT: u32 = 7;
const HISTORY_LIMIT_MAX: u32 = 30;
static API_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Authenticated caller, as resolved by the session provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Minimal health-check API.
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Starts core file logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
pub fn init_logging(level: String, log_dir: String) -> String {
    let settings = match LogSettings::parse(&level, &log_dir) {
        Ok(settings) => settings,
        Err(err) => return err.to_string(),
    };
    match init_logging_inner(&settings) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Response envelope for `get_my_stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsResponse {
    pub ok: bool,
    pub stats: Option<StatsSnapshot>,
    pub message: String,
}

/// Response envelope for `get_my_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub ok: bool,
    /// Most recent day first.
    pub days: Vec<StatsSnapshot>,
    pub message: String,
    pub applied_limit: u32,
}

/// Returns today's counters for the session user, creating them on first
/// access of the day.
pub fn get_my_stats(session: Option<&Session>) -> StatsResponse {
    match with_counters_service(session, |service, user_id| service.get_my_stats(user_id)) {
        Ok(snapshot) => StatsResponse {
            ok: true,
            message: format!("Stats for {}.", snapshot.day()),
            stats: Some(snapshot),
        },
        Err(message) => StatsResponse {
            ok: false,
            stats: None,
            message: format!("get_my_stats failed: {message}"),
        },
    }
}

/// Returns the session user's recent daily counters.
pub fn get_my_history(session: Option<&Session>, limit: Option<u32>) -> HistoryResponse {
    let applied_limit = normalize_history_limit(limit);
    match with_counters_service(session, |service, user_id| {
        service.history(user_id, Some(applied_limit))
    }) {
        Ok(rows) => HistoryResponse {
            ok: true,
            message: format!("Found {} day(s).", rows.len()),
            days: rows.into_iter().map(StatsSnapshot::from).collect(),
            applied_limit,
        },
        Err(message) => HistoryResponse {
            ok: false,
            days: Vec::new(),
            message: format!("get_my_history failed: {message}"),
            applied_limit,
        },
    }
}

fn normalize_history_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => HISTORY_DEFAULT_LIMIT,
        Some(value) if value > HISTORY_LIMIT_MAX => HISTORY_LIMIT_MAX,
        Some(value) => value,
    }
}

fn resolve_api_db_path() -> PathBuf {
    API_DB_PATH
        .get_or_init(|| match CoreConfig::from_env() {
            Ok(config) => config.db_path,
            Err(err) => {
                warn!("event=config_load module=api status=error error={err}");
                CoreConfig::default().db_path
            }
        })
        .clone()
}

fn with_counters_service<T>(
    session: Option<&Session>,
    f: impl FnOnce(
        &CountersService<SqliteCountersRepository<'_>, SystemClock>,
        &UserId,
    ) -> RepoResult<T>,
) -> Result<T, String> {
    let session = session.ok_or_else(|| "unauthorized: no active session".to_string())?;
    let user_id =
        UserId::parse(&session.user_id).map_err(|err| format!("unauthorized: {err}"))?;

    let db_path = resolve_api_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("counters DB open failed: {err}"))?;
    let repo = SqliteCountersRepository::try_new(&conn)
        .map_err(|err| format!("counters repo init failed: {err}"))?;
    let service = CountersService::new(repo, SystemClock);
    f(&service, &user_id).map_err(|err| err.to_string())
}
