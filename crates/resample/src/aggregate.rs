//! Period aggregation of hourly means: max, time of max and total.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use ndarray::{Array2, s};
use rainmax_calendar::Period;
use tracing::{debug, warn};

use crate::error::ResampleError;
use crate::field::{Attrs, Grid, RainField};
use crate::hourly::off_hour_times;
use crate::reduce::reduce_max;

/// Hours in a day; totals are reported as a daily-equivalent depth.
pub const HOURS_PER_DAY: f32 = 24.0;

/// Daily-equivalent depth (mm/day) from the hourly mean rates of one period.
///
/// Missing hours are not gap-filled: if any hour is missing the total is
/// missing.
pub fn period_total(hourly_rates: &[f32]) -> f32 {
    rainmax_stats::mean_propagate(hourly_rates) * HOURS_PER_DAY
}

/// Max, time of max and total of hourly rainfall over one period.
#[derive(Debug, Clone)]
pub struct PeriodAggregate {
    period: Period,
    start: NaiveDateTime,
    grid: Grid,
    max: Array2<f32>,
    max_time: Array2<Option<NaiveDateTime>>,
    total: Array2<f32>,
    attrs: Attrs,
}

impl PeriodAggregate {
    /// Period length.
    pub fn period(&self) -> Period {
        self.period
    }

    /// Start of the period, used as its label.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Spatial grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Maximum hourly rate (mm/hr) per cell.
    pub fn max(&self) -> &Array2<f32> {
        &self.max
    }

    /// Hour at which the maximum occurred, per cell.
    pub fn max_time(&self) -> &Array2<Option<NaiveDateTime>> {
        &self.max_time
    }

    /// Hour of day (0..=23) of the maximum, NaN where missing.
    pub fn max_hour(&self) -> Array2<f32> {
        self.max_time
            .mapv(|t| t.map_or(f32::NAN, |t| t.hour() as f32))
    }

    /// Daily-equivalent total (mm/day) per cell.
    pub fn total(&self) -> &Array2<f32> {
        &self.total
    }

    /// Attributes inherited from the source field.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }
}

/// Aggregate an hourly field into one [`PeriodAggregate`] per period.
///
/// Each period needs every one of its hours for the total to be present;
/// hours absent from the field count as missing. Max and time of max skip
/// missing hours and are masked where every hour is missing. Input times
/// off the clock hour are logged as a warning and used as they are.
///
/// # Errors
///
/// Returns [`ResampleError`] on calendar overflow.
pub fn aggregate(hourly: &RainField, period: Period) -> Result<Vec<PeriodAggregate>, ResampleError> {
    let off = off_hour_times(hourly);
    if let Some(first) = off.first() {
        warn!(first = %first, count = off.len(), "some hourly data not at canonical times");
    }

    let times = hourly.times();
    let (ny, nx) = hourly.grid().shape();
    let mut out = Vec::new();
    let mut buf = Vec::new();

    let mut start = 0;
    while start < times.len() {
        let label = period.floor(times[start]);
        let end = start
            + times[start..]
                .iter()
                .take_while(|&&t| period.floor(t) == label)
                .count();

        let values = hourly.data().slice(s![start..end, .., ..]);
        let (max, max_time) = reduce_max(values, &times[start..end])?.into_parts();

        let expected = hours_in(period, label)?;
        let complete = end - start == expected;
        let total = Array2::from_shape_fn((ny, nx), |(iy, ix)| {
            if !complete {
                return f32::NAN;
            }
            buf.clear();
            buf.extend(values.slice(s![.., iy, ix]).iter().copied());
            period_total(&buf)
        });
        if !complete {
            debug!(
                start = %label,
                got = end - start,
                expected,
                "incomplete period, total marked missing"
            );
        }

        out.push(PeriodAggregate {
            period,
            start: label,
            grid: hourly.grid().clone(),
            max,
            max_time,
            total,
            attrs: hourly.attrs().clone(),
        });
        start = end;
    }
    Ok(out)
}

fn hours_in(period: Period, start: NaiveDateTime) -> Result<usize, ResampleError> {
    let next = period.next(start)?;
    Ok(((next - start).num_seconds() / TimeDelta::hours(1).num_seconds()) as usize)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use ndarray::Array3;

    use super::*;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn hourly(values: &[f32]) -> RainField {
        let times = (0..values.len() as i64).map(|h| t0() + TimeDelta::hours(h)).collect();
        let data = Array3::from_shape_vec((values.len(), 1, 1), values.to_vec()).unwrap();
        RainField::new(times, Grid::regular(0.0, 1.0, 1, 0.0, 1.0, 1), data).unwrap()
    }

    #[test]
    fn total_is_24_times_mean() {
        let values: Vec<f32> = (0..24).map(|h| h as f32 * 0.5).collect();
        let days = aggregate(&hourly(&values), Period::Day).unwrap();
        assert_eq!(days.len(), 1);
        let mean = values.iter().sum::<f32>() / 24.0;
        assert_abs_diff_eq!(days[0].total()[[0, 0]], mean * 24.0, epsilon = 1e-4);
    }

    #[test]
    fn any_missing_hour_makes_total_missing() {
        let mut values = vec![1.0; 24];
        values[7] = f32::NAN;
        let days = aggregate(&hourly(&values), Period::Day).unwrap();
        assert!(days[0].total()[[0, 0]].is_nan());
        assert_eq!(days[0].max()[[0, 0]], 1.0);
    }

    #[test]
    fn short_day_total_is_missing() {
        let days = aggregate(&hourly(&[1.0; 20]), Period::Day).unwrap();
        assert!(days[0].total()[[0, 0]].is_nan());
    }

    #[test]
    fn max_and_hour_of_max() {
        let mut values = vec![0.0; 24];
        values[15] = 12.0;
        let days = aggregate(&hourly(&values), Period::Day).unwrap();
        assert_eq!(days[0].max()[[0, 0]], 12.0);
        assert_eq!(days[0].max_time()[[0, 0]], Some(t0() + TimeDelta::hours(15)));
        assert_eq!(days[0].max_hour()[[0, 0]], 15.0);
    }

    #[test]
    fn all_missing_day_is_masked() {
        let days = aggregate(&hourly(&[f32::NAN; 24]), Period::Day).unwrap();
        assert!(days[0].max()[[0, 0]].is_nan());
        assert_eq!(days[0].max_time()[[0, 0]], None);
        assert!(days[0].max_hour()[[0, 0]].is_nan());
    }

    #[test]
    fn splits_days() {
        let days = aggregate(&hourly(&[1.0; 48]), Period::Day).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].start(), t0() + TimeDelta::days(1));
        assert_eq!(days[1].period(), Period::Day);
    }

    #[test]
    fn attrs_carried() {
        let mut field = hourly(&[1.0; 24]);
        field.set_attr("two_hr_notes", "Missing the previous day");
        let days = aggregate(&field, Period::Day).unwrap();
        assert_eq!(
            days[0].attrs().get("two_hr_notes").map(String::as_str),
            Some("Missing the previous day")
        );
    }

    #[test]
    fn off_hour_input_still_aggregated() {
        let times = (0..3).map(|h| t0() + TimeDelta::minutes(20 + 60 * h)).collect();
        let data = Array3::from_shape_vec((3, 1, 1), vec![1.0, 4.0, 2.0]).unwrap();
        let field = RainField::new(times, Grid::regular(0.0, 1.0, 1, 0.0, 1.0, 1), data).unwrap();
        assert_eq!(off_hour_times(&field).len(), 3);

        let days = aggregate(&field, Period::Day).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].max()[[0, 0]], 4.0);
        assert_eq!(
            days[0].max_time()[[0, 0]],
            Some(t0() + TimeDelta::minutes(80))
        );
        assert!(days[0].total()[[0, 0]].is_nan());
    }
}
