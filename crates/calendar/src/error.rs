//! Error types for the rainmax-calendar crate.

use chrono::NaiveDateTime;

/// Error type for all fallible operations in the rainmax-calendar crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    /// Returned when an encoded time value cannot represent a timestamp.
    #[error("invalid encoded time: {value} hours since epoch")]
    InvalidTimestamp {
        /// The offending encoded value.
        value: f64,
    },

    /// Returned when stepping a period runs past the representable range.
    #[error("cannot step {period} period beyond {start}")]
    Overflow {
        /// Start of the period that could not be advanced.
        start: NaiveDateTime,
        /// Name of the period.
        period: &'static str,
    },

    /// Returned when a sequence is requested with its end before its start.
    #[error("sequence end {last} precedes start {first}")]
    ReversedRange {
        /// First timestamp of the requested range.
        first: NaiveDateTime,
        /// Last timestamp of the requested range.
        last: NaiveDateTime,
    },
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn display_invalid_timestamp() {
        let err = CalendarError::InvalidTimestamp { value: f64::NAN };
        assert_eq!(err.to_string(), "invalid encoded time: NaN hours since epoch");
    }

    #[test]
    fn display_overflow() {
        let err = CalendarError::Overflow {
            start: t0(),
            period: "monthly",
        };
        assert_eq!(
            err.to_string(),
            "cannot step monthly period beyond 2020-07-01 00:00:00"
        );
    }

    #[test]
    fn display_reversed_range() {
        let err = CalendarError::ReversedRange {
            first: t0(),
            last: t0() - chrono::TimeDelta::hours(1),
        };
        assert!(err.to_string().contains("precedes start"));
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<CalendarError>();
    }
}
