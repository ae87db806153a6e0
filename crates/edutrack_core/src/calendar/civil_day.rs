//! Civil-day resolution in the platform timezone (Asia/Kathmandu).
//!
//! # Responsibility
//! - Map any UTC instant to the calendar day observed at UTC+05:45.
//! - Provide the canonical `YYYY-MM-DD` key and a human-readable label.
//!
//! # Invariants
//! - The offset is fixed; Kathmandu observes no daylight saving time.
//! - Local midnight belongs to the new day (inclusive-from-below boundary).

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Seconds east of UTC for Asia/Kathmandu.
pub const PLATFORM_UTC_OFFSET_SECONDS: i32 = 5 * 3600 + 45 * 60;

/// Fixed platform offset; deliberately not looked up from tzdata.
pub const PLATFORM_OFFSET: FixedOffset = match FixedOffset::east_opt(PLATFORM_UTC_OFFSET_SECONDS) {
    Some(offset) => offset,
    None => panic!("platform offset out of range"),
};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const DAY_LABEL_FORMAT: &str = "%A, %B %-d, %Y";

/// Calendar date observed in the platform timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDay(NaiveDate);

impl CivilDay {
    /// Resolves the civil day containing `instant`.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&PLATFORM_OFFSET).date_naive())
    }

    /// Builds a day from calendar components; `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Storage / wire key, `YYYY-MM-DD`.
    pub fn key(self) -> String {
        self.0.format(DAY_KEY_FORMAT).to_string()
    }

    /// Dashboard label, e.g. `Saturday, June 15, 2024`.
    pub fn label(self) -> String {
        self.0.format(DAY_LABEL_FORMAT).to_string()
    }
}

/// Resolves the platform civil day for an explicit instant.
///
/// Pure and total; callers pass the instant so tests can pin boundaries.
pub fn resolve_day(instant: DateTime<Utc>) -> CivilDay {
    CivilDay::from_instant(instant)
}

impl Display for CivilDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

/// Error for malformed day keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCivilDayError(String);

impl Display for ParseCivilDayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid civil day `{}`; expected YYYY-MM-DD", self.0)
    }
}

impl Error for ParseCivilDayError {}

impl FromStr for CivilDay {
    type Err = ParseCivilDayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields; keys must stay fixed-width to sort.
        if value.len() != 10 {
            return Err(ParseCivilDayError(value.to_string()));
        }
        NaiveDate::parse_from_str(value, DAY_KEY_FORMAT)
            .map(Self)
            .map_err(|_| ParseCivilDayError(value.to_string()))
    }
}

impl Serialize for CivilDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CivilDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_day, CivilDay};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn utc_midnight_is_same_day_in_kathmandu() {
        assert_eq!(resolve_day(utc("2024-06-15T00:00:00Z")).key(), "2024-06-15");
    }

    #[test]
    fn local_midnight_boundary_is_inclusive_from_below() {
        assert_eq!(resolve_day(utc("2024-06-14T18:14:59Z")).key(), "2024-06-14");
        assert_eq!(resolve_day(utc("2024-06-14T18:15:00Z")).key(), "2024-06-15");

        let boundary = utc("2024-06-14T18:15:00Z");
        let just_before = boundary - Duration::milliseconds(1);
        assert_eq!(resolve_day(just_before).key(), "2024-06-14");
    }

    #[test]
    fn instants_within_one_local_day_share_a_key() {
        let start = utc("2024-06-14T18:15:00Z");
        let expected = resolve_day(start);
        for minutes in [1, 60, 6 * 60, 23 * 60, 24 * 60 - 1] {
            assert_eq!(resolve_day(start + Duration::minutes(minutes)), expected);
        }
        assert_ne!(resolve_day(start + Duration::days(1)), expected);
    }

    #[test]
    fn year_rollover_follows_local_offset() {
        let new_year_local = Utc.with_ymd_and_hms(2024, 12, 31, 18, 15, 0).unwrap();
        assert_eq!(resolve_day(new_year_local).key(), "2025-01-01");
    }

    #[test]
    fn parse_rejects_unpadded_and_impossible_dates() {
        assert!("2024-6-15".parse::<CivilDay>().is_err());
        assert!("2024-02-30".parse::<CivilDay>().is_err());
        assert_eq!(
            "2024-06-15".parse::<CivilDay>().unwrap(),
            CivilDay::from_ymd(2024, 6, 15).unwrap()
        );
    }

    #[test]
    fn label_is_human_readable() {
        let day = CivilDay::from_ymd(2024, 6, 15).unwrap();
        assert_eq!(day.label(), "Saturday, June 15, 2024");
        assert_eq!(day.to_string(), "2024-06-15");
    }

    #[test]
    fn serializes_as_plain_date_string() {
        let day = CivilDay::from_ymd(2024, 6, 15).unwrap();
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"2024-06-15\"");
        let back: CivilDay = serde_json::from_str("\"2024-06-15\"").unwrap();
        assert_eq!(back, day);
    }
}
