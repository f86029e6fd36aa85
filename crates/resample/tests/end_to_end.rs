use approx::assert_abs_diff_eq;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use ndarray::Array3;
use rainmax_calendar::Period;
use rainmax_resample::{
    Grid, HourCarry, HourlyConfig, PeriodAggregate, PeriodRollup, QcFilter, RainField,
    TWO_HOUR_NOTES_ATTR, aggregate, hourly_means,
};

fn midnight(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 7, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn grid() -> Grid {
    Grid::regular(500.0, 1000.0, 2, 1_000_500.0, 1000.0, 2)
}

/// One day of 15-minute samples on a 2x2 grid, `rate(hour, iy, ix)` mm/hr.
fn quarter_hourly_day(day: u32, rate: impl Fn(usize, usize, usize) -> f32) -> RainField {
    let t0 = midnight(day);
    let times: Vec<_> = (0..96).map(|k| t0 + TimeDelta::minutes(15 * k)).collect();
    let data = Array3::from_shape_fn((96, 2, 2), |(k, iy, ix)| rate(k / 4, iy, ix));
    RainField::new(times, grid(), data).unwrap()
}

/// Day 2 has a 500 mm/hr artefact at hour 10 in cell (0, 0); the largest
/// plausible rate that day is 40 mm/hr at hour 9.
fn three_days() -> Vec<RainField> {
    (12..=14)
        .map(|d| {
            quarter_hourly_day(d, move |h, iy, ix| match (d, h, iy, ix) {
                (13, 10, 0, 0) => 500.0,
                (13, 9, 0, 0) => 40.0,
                _ => 1.0 + (iy + ix) as f32,
            })
        })
        .collect()
}

fn daily(field: &RainField) -> (RainField, Vec<PeriodAggregate>) {
    let qc = QcFilter::default();
    let hourly = hourly_means(&qc.apply(field), &HourlyConfig::new()).unwrap();
    let days = aggregate(&hourly, Period::Day).unwrap();
    (hourly, days)
}

#[test]
fn qc_masks_artefact_and_max_falls_back() {
    let fields = three_days();
    let (hourly, days) = daily(&fields[1]);

    assert_eq!(hourly.n_times(), 24);
    assert!(hourly.data()[[10, 0, 0]].is_nan());
    assert_abs_diff_eq!(hourly.data()[[9, 0, 0]], 40.0);

    assert_eq!(days.len(), 1);
    assert_abs_diff_eq!(days[0].max()[[0, 0]], 40.0);
    assert_eq!(
        days[0].max_time()[[0, 0]],
        Some(midnight(13) + TimeDelta::hours(9))
    );
    // The masked hour makes the day's total missing.
    assert!(days[0].total()[[0, 0]].is_nan());
    assert_abs_diff_eq!(days[0].total()[[1, 1]], 3.0 * 24.0, epsilon = 1e-3);
}

#[test]
fn other_days_untouched() {
    let fields = three_days();
    for field in [&fields[0], &fields[2]] {
        let (_, days) = daily(field);
        assert_abs_diff_eq!(days[0].max()[[0, 0]], 1.0);
        assert_eq!(days[0].max_time()[[0, 0]], Some(days[0].start()));
        assert_abs_diff_eq!(days[0].total()[[0, 0]], 24.0, epsilon = 1e-3);
    }
}

#[test]
fn monthly_rollup_over_three_days() {
    let mut rollup = PeriodRollup::new(Period::Month);
    for field in three_days() {
        let (_, days) = daily(&field);
        for day in days {
            assert!(rollup.advance(day).unwrap().is_none());
        }
    }
    let batch = rollup.finalize().unwrap().unwrap();
    let summary = batch.summary();

    assert_eq!(batch.aggregates().len(), 3);
    assert_eq!(summary.start(), midnight(1));
    assert_eq!(summary.latest(), midnight(14));
    assert_abs_diff_eq!(summary.max()[[0, 0]], 40.0);
    assert_eq!(
        summary.max_time()[[0, 0]],
        Some(midnight(13) + TimeDelta::hours(9))
    );
    // Missing day-2 total is skipped in the monthly mean.
    assert_abs_diff_eq!(summary.mean()[[0, 0]], 24.0, epsilon = 1e-3);
}

#[test]
fn two_hour_variant_is_continuous_across_days() {
    let mut carry = HourCarry::new();
    let mut rolled_days = Vec::new();
    for field in three_days() {
        let (hourly, _) = daily(&field);
        let rolled = carry.roll(&hourly).unwrap();
        carry.remember(&hourly);
        rolled_days.push(rolled);
    }

    assert!(rolled_days[0].data()[[0, 1, 1]].is_nan());
    assert!(rolled_days[0].attr(TWO_HOUR_NOTES_ATTR).is_some());

    for rolled in &rolled_days[1..] {
        assert_eq!(rolled.attr(TWO_HOUR_NOTES_ATTR), None);
        assert_abs_diff_eq!(rolled.data()[[0, 1, 1]], 3.0);
    }

    // Hours 10 and 11 of day 2 touch the masked hour.
    let day2 = &rolled_days[1];
    assert_abs_diff_eq!(day2.data()[[9, 0, 0]], 20.5);
    assert!(day2.data()[[10, 0, 0]].is_nan());
    assert!(day2.data()[[11, 0, 0]].is_nan());
}
