//! Core domain logic for EduTrack daily gamification counters.
//! This crate is the single source of truth for the per-day counters
//! invariants.

pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::civil_day::{resolve_day, CivilDay, ParseCivilDayError, PLATFORM_OFFSET};
pub use calendar::clock::{Clock, FixedClock, SystemClock};
pub use config::{default_log_level, ConfigError, CoreConfig, LogSettings};
pub use logging::{init_logging, LoggingError};
pub use model::counters::{CounterKind, CountersId, CountersValidationError, DailyCounters, UserId};
pub use repo::counters_repo::{
    CountersListQuery, CountersRepository, CreateOutcome, RepoError, RepoResult,
    SqliteCountersRepository,
};
pub use service::counters_service::{CountersService, Materialized, StatsSnapshot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
