//! Injectable source of "now".

use chrono::{DateTime, Utc};

use super::civil_day::{resolve_day, CivilDay};

/// Abstraction over the current instant so day resolution is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Civil day for [`Clock::now`] in the platform timezone.
    fn today(&self) -> CivilDay {
        resolve_day(self.now())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn fixed_clock_today_uses_platform_offset() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 14, 18, 15, 0).unwrap());
        assert_eq!(clock.today().key(), "2024-06-15");
    }

    #[test]
    fn clock_trait_object_works() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        let clock: Box<dyn Clock> = Box::new(FixedClock::new(now));
        assert_eq!(clock.now(), now);
    }
}
