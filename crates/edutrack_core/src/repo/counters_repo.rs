//! Daily counters repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Fetch, create, increment and list `daily_counters` rows.
//! - Translate the `(user_id, day)` uniqueness violation into
//!   `CreateOutcome::Conflict`.
//!
//! # Invariants
//! - Reads reject invalid persisted state instead of masking it.
//! - Creation never overwrites an existing row.
//! - Increments only touch the addressed (user, day) row.

use crate::calendar::civil_day::CivilDay;
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::counters::{CounterKind, CountersValidationError, DailyCounters, UserId};
use rusqlite::{ffi, params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const COUNTERS_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    day,
    lessons_completed,
    quizzes_completed,
    questions_asked,
    minutes_studied,
    xp_earned,
    created_at,
    updated_at
FROM daily_counters";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for counters persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CountersValidationError),
    Db(DbError),
    NotFound {
        user_id: UserId,
        day: CivilDay,
    },
    InvalidData(String),
    /// The store reported a uniqueness conflict but the winning row could
    /// not be read back.
    MissingAfterConflict {
        user_id: UserId,
        day: CivilDay,
    },
    SchemaNotReady {
        db_version: u32,
        expected: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { user_id, day } => {
                write!(f, "daily counters not found for user `{user_id}` on {day}")
            }
            Self::InvalidData(message) => {
                write!(f, "invalid persisted counters data: {message}")
            }
            Self::MissingAfterConflict { user_id, day } => write!(
                f,
                "daily counters for user `{user_id}` on {day} conflicted on create but are not readable"
            ),
            Self::SchemaNotReady {
                db_version,
                expected,
            } => write!(
                f,
                "database schema version {db_version} does not match expected {expected}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::InvalidData(_)
            | Self::MissingAfterConflict { .. }
            | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<CountersValidationError> for RepoError {
    fn from(value: CountersValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a create attempt.
///
/// `Conflict` is an expected outcome under concurrent first access and is
/// kept apart from `Failed` so callers can branch on it explicitly.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(DailyCounters),
    Conflict,
    Failed(RepoError),
}

/// Query options for listing a user's history.
#[derive(Debug, Clone, Default)]
pub struct CountersListQuery {
    /// Inclusive lower bound.
    pub from_day: Option<CivilDay>,
    /// Inclusive upper bound.
    pub to_day: Option<CivilDay>,
    pub limit: Option<u32>,
}

/// Repository interface for daily counters.
pub trait CountersRepository {
    fn get_counters(&self, user_id: &UserId, day: CivilDay) -> RepoResult<Option<DailyCounters>>;
    fn create_counters(&self, counters: &DailyCounters) -> CreateOutcome;
    fn increment_counter(
        &self,
        user_id: &UserId,
        day: CivilDay,
        kind: CounterKind,
        amount: u32,
        at_epoch_ms: i64,
    ) -> RepoResult<DailyCounters>;
    fn list_counters(
        &self,
        user_id: &UserId,
        query: &CountersListQuery,
    ) -> RepoResult<Vec<DailyCounters>>;
}

impl<R: CountersRepository + ?Sized> CountersRepository for &R {
    fn get_counters(&self, user_id: &UserId, day: CivilDay) -> RepoResult<Option<DailyCounters>> {
        (**self).get_counters(user_id, day)
    }

    fn create_counters(&self, counters: &DailyCounters) -> CreateOutcome {
        (**self).create_counters(counters)
    }

    fn increment_counter(
        &self,
        user_id: &UserId,
        day: CivilDay,
        kind: CounterKind,
        amount: u32,
        at_epoch_ms: i64,
    ) -> RepoResult<DailyCounters> {
        (**self).increment_counter(user_id, day, kind, amount, at_epoch_ms)
    }

    fn list_counters(
        &self,
        user_id: &UserId,
        query: &CountersListQuery,
    ) -> RepoResult<Vec<DailyCounters>> {
        (**self).list_counters(user_id, query)
    }
}

/// SQLite-backed counters repository.
pub struct SqliteCountersRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCountersRepository<'conn> {
    /// Wraps a connection without checking its schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying migrations are fully applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let db_version = current_user_version(conn)?;
        let expected = latest_version();
        if db_version != expected {
            return Err(RepoError::SchemaNotReady {
                db_version,
                expected,
            });
        }
        Ok(Self { conn })
    }
}

impl CountersRepository for SqliteCountersRepository<'_> {
    fn get_counters(&self, user_id: &UserId, day: CivilDay) -> RepoResult<Option<DailyCounters>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{COUNTERS_SELECT_SQL}
             WHERE user_id = ?1
               AND day = ?2;"
        ))?;

        let mut rows = stmt.query(params![user_id.as_str(), day.key()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_counters_row(row)?));
        }

        Ok(None)
    }

    fn create_counters(&self, counters: &DailyCounters) -> CreateOutcome {
        let inserted = self.conn.execute(
            "INSERT INTO daily_counters (
                id,
                user_id,
                day,
                lessons_completed,
                quizzes_completed,
                questions_asked,
                minutes_studied,
                xp_earned,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                counters.id.to_string(),
                counters.user_id.as_str(),
                counters.day.key(),
                counters.lessons_completed,
                counters.quizzes_completed,
                counters.questions_asked,
                counters.minutes_studied,
                counters.xp_earned,
                counters.created_at,
                counters.updated_at,
            ],
        );

        match inserted {
            Ok(_) => CreateOutcome::Created(counters.clone()),
            Err(err) if is_user_day_conflict(&err) => CreateOutcome::Conflict,
            Err(err) => CreateOutcome::Failed(err.into()),
        }
    }

    fn increment_counter(
        &self,
        user_id: &UserId,
        day: CivilDay,
        kind: CounterKind,
        amount: u32,
        at_epoch_ms: i64,
    ) -> RepoResult<DailyCounters> {
        if amount == 0 {
            return Err(CountersValidationError::ZeroIncrement.into());
        }

        // Column names come from a closed enum, never from input.
        let column = kind.column();
        let changed = self.conn.execute(
            &format!(
                "UPDATE daily_counters
                 SET
                    {column} = {column} + ?1,
                    updated_at = MAX(updated_at, ?2)
                 WHERE user_id = ?3
                   AND day = ?4
                   AND {column} + ?1 <= ?5;"
            ),
            params![
                amount,
                at_epoch_ms,
                user_id.as_str(),
                day.key(),
                i64::from(u32::MAX)
            ],
        )?;

        if changed == 0 {
            return match self.get_counters(user_id, day)? {
                Some(_) => Err(CountersValidationError::CounterOverflow(kind).into()),
                None => Err(RepoError::NotFound {
                    user_id: user_id.clone(),
                    day,
                }),
            };
        }

        self.get_counters(user_id, day)?
            .ok_or_else(|| RepoError::NotFound {
                user_id: user_id.clone(),
                day,
            })
    }

    fn list_counters(
        &self,
        user_id: &UserId,
        query: &CountersListQuery,
    ) -> RepoResult<Vec<DailyCounters>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COUNTERS_SELECT_SQL}
             WHERE user_id = ?1
               AND (?2 IS NULL OR day >= ?2)
               AND (?3 IS NULL OR day <= ?3)
             ORDER BY day DESC
             LIMIT ?4;"
        ))?;

        let limit = query.limit.map_or(-1, i64::from);
        let mut rows = stmt.query(params![
            user_id.as_str(),
            query.from_day.map(CivilDay::key),
            query.to_day.map(CivilDay::key),
            limit,
        ])?;

        let mut history = Vec::new();
        while let Some(row) = rows.next()? {
            history.push(parse_counters_row(row)?);
        }

        Ok(history)
    }
}

/// Matches only the `(user_id, day)` UNIQUE violation; primary-key and
/// CHECK violations stay hard failures.
fn is_user_day_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation
                && inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_counters_row(row: &Row<'_>) -> RepoResult<DailyCounters> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in daily_counters.id"))
    })?;

    let user_text: String = row.get("user_id")?;
    let user_id = UserId::parse(&user_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "blank user id for row `{id_text}` in daily_counters.user_id"
        ))
    })?;

    let day_text: String = row.get("day")?;
    let day = day_text
        .parse::<CivilDay>()
        .map_err(|err| RepoError::InvalidData(format!("{err} in daily_counters.day")))?;

    Ok(DailyCounters {
        id,
        user_id,
        day,
        lessons_completed: counter_value(row, CounterKind::LessonsCompleted)?,
        quizzes_completed: counter_value(row, CounterKind::QuizzesCompleted)?,
        questions_asked: counter_value(row, CounterKind::QuestionsAsked)?,
        minutes_studied: counter_value(row, CounterKind::MinutesStudied)?,
        xp_earned: counter_value(row, CounterKind::XpEarned)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn counter_value(row: &Row<'_>, kind: CounterKind) -> RepoResult<u32> {
    let column = kind.column();
    let raw: i64 = row.get(column)?;
    u32::try_from(raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "counter value `{raw}` out of range in daily_counters.{column}"
        ))
    })
}
