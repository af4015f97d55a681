//! Source of "now" for date stamping and generated file names.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always returns the same instant. Useful for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Local>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Local>) -> Self {
        FixedClock { instant }
    }

    /// Noon local time on `date`.
    pub fn at_noon(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        let instant = Local
            .from_local_datetime(&noon)
            .earliest()
            .unwrap_or_else(Local::now);
        FixedClock { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let clock = FixedClock::at_noon(date);

        assert_eq!(clock.today(), date);
        assert_eq!(clock.now(), clock.now());
    }
}
