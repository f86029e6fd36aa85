//! CF-style time encoding used in the NetCDF outputs.

use chrono::{DateTime, NaiveDateTime};

use crate::error::CalendarError;

/// Units attribute written alongside every encoded time variable.
pub const TIME_UNITS: &str = "hours since 1970-01-01 00:00:00";

/// Encode `t` as fractional hours since 1970-01-01T00:00.
pub fn hours_since_epoch(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp() as f64 / 3600.0
}

/// Decode fractional hours since 1970-01-01T00:00, rounded to the second.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidTimestamp`] for non-finite or
/// out-of-range values. Callers treat NaN as "missing" before calling.
pub fn from_hours_since_epoch(hours: f64) -> Result<NaiveDateTime, CalendarError> {
    if !hours.is_finite() {
        return Err(CalendarError::InvalidTimestamp { value: hours });
    }
    let seconds = (hours * 3600.0).round();
    if seconds.abs() > i64::MAX as f64 / 2.0 {
        return Err(CalendarError::InvalidTimestamp { value: hours });
    }
    DateTime::from_timestamp(seconds as i64, 0)
        .map(|dt| dt.naive_utc())
        .ok_or(CalendarError::InvalidTimestamp { value: hours })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn epoch_is_zero() {
        let t = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(hours_since_epoch(t), 0.0);
    }

    #[test]
    fn encodes_and_decodes_hour() {
        let t = NaiveDate::from_ymd_opt(2021, 7, 12)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let h = hours_since_epoch(t);
        assert_eq!(h.fract(), 0.0);
        assert_eq!(from_hours_since_epoch(h).unwrap(), t);
    }

    #[test]
    fn quarter_hour_is_fractional() {
        let t = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 15, 0)
            .unwrap();
        assert_eq!(hours_since_epoch(t), 0.25);
    }

    #[test]
    fn nan_rejected() {
        assert!(from_hours_since_epoch(f64::NAN).is_err());
        assert!(from_hours_since_epoch(f64::INFINITY).is_err());
    }
}
