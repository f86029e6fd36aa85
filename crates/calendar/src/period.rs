//! Resampling periods.

use chrono::{Datelike, Months, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::error::CalendarError;

/// A fixed-width, non-overlapping resampling period.
///
/// Periods are labelled by their start (left edge), so flooring a
/// timestamp returns the label of the period that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    /// One clock hour.
    Hour,
    /// One calendar day.
    Day,
    /// One calendar month.
    Month,
    /// One calendar year.
    Year,
}

impl Period {
    /// Returns the start of the period containing `t`.
    pub fn floor(self, t: NaiveDateTime) -> NaiveDateTime {
        let midnight = t.date().and_time(NaiveTime::MIN);
        match self {
            Self::Hour => midnight + TimeDelta::hours(i64::from(t.hour())),
            Self::Day => midnight,
            Self::Month => midnight - TimeDelta::days(i64::from(t.day0())),
            Self::Year => midnight - TimeDelta::days(i64::from(t.ordinal0())),
        }
    }

    /// Returns the start of the period following the one that starts at `start`.
    ///
    /// `start` is floored first, so any timestamp inside a period yields
    /// the start of the next period.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Overflow`] if the next period start is not
    /// representable.
    pub fn next(self, start: NaiveDateTime) -> Result<NaiveDateTime, CalendarError> {
        let start = self.floor(start);
        let next = match self {
            Self::Hour => start.checked_add_signed(TimeDelta::hours(1)),
            Self::Day => start.checked_add_signed(TimeDelta::days(1)),
            Self::Month => start.checked_add_months(Months::new(1)),
            Self::Year => start.checked_add_months(Months::new(12)),
        };
        next.ok_or(CalendarError::Overflow {
            start,
            period: self.name(),
        })
    }

    /// Returns `true` if `a` and `b` fall inside the same period.
    pub fn same(self, a: NaiveDateTime, b: NaiveDateTime) -> bool {
        self.floor(a) == self.floor(b)
    }

    /// Adjective used to prefix output variable names (`dailyMax`, `monthlyMax`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Hour => "hourly",
            Self::Day => "daily",
            Self::Month => "monthly",
            Self::Year => "annual",
        }
    }

    /// Short label for the period starting at `start`, used in file names.
    pub fn label(self, start: NaiveDateTime) -> String {
        let fmt = match self {
            Self::Hour => "%Y-%m-%dT%H",
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        };
        start.format(fmt).to_string()
    }
}

/// Returns `true` if `t` lies exactly on a clock hour.
pub fn is_on_the_hour(t: NaiveDateTime) -> bool {
    t.minute() == 0 && t.second() == 0 && t.nanosecond() == 0
}
