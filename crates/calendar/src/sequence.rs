//! Period-start sequence generation.

use chrono::NaiveDateTime;

use crate::error::CalendarError;
use crate::period::Period;

/// Generates every period start from the period containing `first` to the
/// period containing `last`, inclusive.
///
/// Used to lay out resampled bins so that periods with no samples still
/// appear (as missing) in the output.
///
/// # Errors
///
/// Returns [`CalendarError::ReversedRange`] if `last < first`, or
/// [`CalendarError::Overflow`] if stepping runs out of range.
pub fn period_sequence(
    first: NaiveDateTime,
    last: NaiveDateTime,
    period: Period,
) -> Result<Vec<NaiveDateTime>, CalendarError> {
    if last < first {
        return Err(CalendarError::ReversedRange { first, last });
    }
    let end = period.floor(last);
    let mut current = period.floor(first);
    let mut starts = vec![current];
    while current < end {
        current = period.next(current)?;
        starts.push(current);
    }
    Ok(starts)
}
