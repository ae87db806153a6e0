//! Daily counters domain model.
//!
//! # Responsibility
//! - Define the per-user, per-day activity tally record.
//! - Provide named access to individual counters.
//!
//! # Invariants
//! - `user_id` is never blank.
//! - A freshly materialized record has every counter at zero and
//!   `updated_at == created_at`.

use crate::calendar::civil_day::CivilDay;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable row identity of one daily counters record.
pub type CountersId = Uuid;

/// Opaque, non-blank user identifier supplied by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Trims surrounding whitespace and rejects blank ids.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CountersValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CountersValidationError::BlankUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = CountersValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Validation failures for counters inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountersValidationError {
    BlankUserId,
    ZeroIncrement,
    CounterOverflow(CounterKind),
}

impl Display for CountersValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUserId => write!(f, "user_id must not be blank"),
            Self::ZeroIncrement => write!(f, "increment amount must be positive"),
            Self::CounterOverflow(kind) => {
                write!(f, "increment would overflow counter `{}`", kind.name())
            }
        }
    }
}

impl Error for CountersValidationError {}

/// Named activity tally tracked per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterKind {
    LessonsCompleted,
    QuizzesCompleted,
    /// Questions sent to the chat tutor.
    QuestionsAsked,
    MinutesStudied,
    XpEarned,
}

impl CounterKind {
    pub const ALL: [CounterKind; 5] = [
        CounterKind::LessonsCompleted,
        CounterKind::QuizzesCompleted,
        CounterKind::QuestionsAsked,
        CounterKind::MinutesStudied,
        CounterKind::XpEarned,
    ];

    /// Storage column backing this counter.
    pub fn column(self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::QuizzesCompleted => "quizzes_completed",
            Self::QuestionsAsked => "questions_asked",
            Self::MinutesStudied => "minutes_studied",
            Self::XpEarned => "xp_earned",
        }
    }

    /// Wire name, matching the serialized field of `DailyCounters`.
    pub fn name(self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessonsCompleted",
            Self::QuizzesCompleted => "quizzesCompleted",
            Self::QuestionsAsked => "questionsAsked",
            Self::MinutesStudied => "minutesStudied",
            Self::XpEarned => "xpEarned",
        }
    }

    /// Parses either the wire name or the storage column name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == value || kind.column() == value)
    }
}

/// Per-user, per-day activity tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounters {
    pub id: CountersId,
    pub user_id: UserId,
    pub day: CivilDay,
    pub lessons_completed: u32,
    pub quizzes_completed: u32,
    pub questions_asked: u32,
    pub minutes_studied: u32,
    pub xp_earned: u32,
    /// Unix epoch milliseconds of the instant that materialized the row.
    pub created_at: i64,
    /// Unix epoch milliseconds of the latest increment.
    pub updated_at: i64,
}

impl DailyCounters {
    /// Creates a zeroed record with a generated stable ID.
    pub fn zeroed(user_id: UserId, day: CivilDay, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            day,
            lessons_completed: 0,
            quizzes_completed: 0,
            questions_asked: 0,
            minutes_studied: 0,
            xp_earned: 0,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::LessonsCompleted => self.lessons_completed,
            CounterKind::QuizzesCompleted => self.quizzes_completed,
            CounterKind::QuestionsAsked => self.questions_asked,
            CounterKind::MinutesStudied => self.minutes_studied,
            CounterKind::XpEarned => self.xp_earned,
        }
    }

    /// Whether every counter is still zero.
    pub fn is_untouched(&self) -> bool {
        CounterKind::ALL.into_iter().all(|kind| self.get(kind) == 0)
    }
}
