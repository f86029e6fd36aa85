//! Reduction of one day archive's hourly field to the day it covers.

use anyhow::Result;
use tracing::warn;

use rainmax_calendar::Period;
use rainmax_resample::{PeriodAggregate, RainField, aggregate};

/// Aggregate `hourly` by day and keep the first day.
///
/// An archive that runs into the next day (for example one holding 00:00
/// of the following day) would otherwise duplicate the next archive's day.
pub fn archive_day(hourly: &RainField) -> Result<Option<PeriodAggregate>> {
    let days = aggregate(hourly, Period::Day)?;
    if days.len() > 1 {
        warn!(
            n_days = days.len(),
            first = %days[0].start(),
            "archive spans several days, keeping the first"
        );
    }
    let day = days.into_iter().next();
    if day.is_none() {
        warn!("archive produced no days");
    }
    Ok(day)
}
