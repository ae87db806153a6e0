//! Daily counters use-case service.
//!
//! # Responsibility
//! - Materialize today's counters record on first access (read-or-create).
//! - Serve the stats payload and history reads for dashboards.
//!
//! # Invariants
//! - The instant is resolved to a civil day once per call and that day is
//!   used for every store access in the call.
//! - No in-process lock spans fetch and create; a lost creation race is
//!   recovered by re-reading the committed row.
//! - Existing rows are returned unchanged, never re-initialized.

use crate::calendar::civil_day::{resolve_day, CivilDay};
use crate::calendar::clock::Clock;
use crate::model::counters::{CounterKind, DailyCounters, UserId};
use crate::repo::counters_repo::{
    CountersListQuery, CountersRepository, CreateOutcome, RepoError, RepoResult,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::time::Instant;

/// How a materialize call obtained its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Existing,
    Created,
    /// Another caller committed first; its row was read back.
    ConflictRecovered,
}

impl Materialized {
    fn label(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Created => "created",
            Self::ConflictRecovered => "conflict_recovered",
        }
    }
}

/// Stats payload for the current civil day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Human-readable form of the resolved day.
    pub date_label: String,
    #[serde(flatten)]
    pub counters: DailyCounters,
}

impl StatsSnapshot {
    pub fn day(&self) -> CivilDay {
        self.counters.day
    }
}

impl From<DailyCounters> for StatsSnapshot {
    fn from(counters: DailyCounters) -> Self {
        Self {
            date_label: counters.day.label(),
            counters,
        }
    }
}

/// Use-case service for daily counters.
pub struct CountersService<R: CountersRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: CountersRepository, C: Clock> CountersService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Returns the counters for the civil day containing `instant`,
    /// creating a zeroed record when none exists.
    ///
    /// # Errors
    /// - Store failures other than the `(user, day)` conflict propagate.
    /// - `RepoError::MissingAfterConflict` if the conflicting row cannot be
    ///   read back.
    pub fn ensure_today_counters(
        &self,
        user_id: &UserId,
        instant: DateTime<Utc>,
    ) -> RepoResult<DailyCounters> {
        self.materialize(user_id, instant).map(|(counters, _)| counters)
    }

    /// Same as [`Self::ensure_today_counters`], also reporting which path
    /// produced the record.
    pub fn materialize(
        &self,
        user_id: &UserId,
        instant: DateTime<Utc>,
    ) -> RepoResult<(DailyCounters, Materialized)> {
        let started_at = Instant::now();
        let day = resolve_day(instant);

        let result = self.materialize_day(user_id, day, instant);
        match &result {
            Ok((_, outcome)) => info!(
                "event=counters_ensure module=service status=ok outcome={} day={} duration_ms={}",
                outcome.label(),
                day,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=counters_ensure module=service status=error day={} duration_ms={} error={}",
                day,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn materialize_day(
        &self,
        user_id: &UserId,
        day: CivilDay,
        instant: DateTime<Utc>,
    ) -> RepoResult<(DailyCounters, Materialized)> {
        if let Some(existing) = self.repo.get_counters(user_id, day)? {
            return Ok((existing, Materialized::Existing));
        }

        let fresh = DailyCounters::zeroed(user_id.clone(), day, instant.timestamp_millis());
        match self.repo.create_counters(&fresh) {
            CreateOutcome::Created(created) => Ok((created, Materialized::Created)),
            CreateOutcome::Conflict => {
                debug!(
                    "event=counters_conflict module=service status=recovering day={}",
                    day
                );
                match self.repo.get_counters(user_id, day)? {
                    Some(winner) => Ok((winner, Materialized::ConflictRecovered)),
                    None => Err(RepoError::MissingAfterConflict {
                        user_id: user_id.clone(),
                        day,
                    }),
                }
            }
            CreateOutcome::Failed(err) => Err(err),
        }
    }

    /// Today's counters plus the resolved day label, from the injected clock.
    pub fn get_my_stats(&self, user_id: &UserId) -> RepoResult<StatsSnapshot> {
        self.ensure_today_counters(user_id, self.clock.now())
            .map(StatsSnapshot::from)
    }

    /// Adds `amount` to one counter of today's record, materializing it first.
    pub fn record_activity(
        &self,
        user_id: &UserId,
        kind: CounterKind,
        amount: u32,
    ) -> RepoResult<DailyCounters> {
        let now = self.clock.now();
        let today = self.ensure_today_counters(user_id, now)?;
        match self
            .repo
            .increment_counter(user_id, today.day, kind, amount, now.timestamp_millis())
        {
            Ok(updated) => Ok(updated),
            Err(err) => {
                warn!(
                    "event=counters_increment module=service status=error counter={} day={} error={}",
                    kind.name(),
                    today.day,
                    err
                );
                Err(err)
            }
        }
    }

    /// Most recent days first; `limit = None` returns the full history.
    pub fn history(&self, user_id: &UserId, limit: Option<u32>) -> RepoResult<Vec<DailyCounters>> {
        self.repo.list_counters(
            user_id,
            &CountersListQuery {
                limit,
                ..CountersListQuery::default()
            },
        )
    }

    /// History restricted to an inclusive day range.
    pub fn history_between(
        &self,
        user_id: &UserId,
        from_day: CivilDay,
        to_day: CivilDay,
    ) -> RepoResult<Vec<DailyCounters>> {
        self.repo.list_counters(
            user_id,
            &CountersListQuery {
                from_day: Some(from_day),
                to_day: Some(to_day),
                limit: None,
            },
        )
    }
}
