use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rainmax_calendar::{Period, from_hours_since_epoch, hours_since_epoch, period_sequence};

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

#[test]
fn fifteen_minute_day_floors_to_24_hours() {
    let first = at(2021, 7, 12, 0, 0);
    let samples: Vec<_> = (0..96).map(|i| first + TimeDelta::minutes(15 * i)).collect();

    let mut hours: Vec<_> = samples.iter().map(|&t| Period::Hour.floor(t)).collect();
    hours.dedup();
    assert_eq!(hours.len(), 24);
    assert_eq!(hours, period_sequence(first, samples[95], Period::Hour).unwrap());
}

#[test]
fn months_across_year_boundary() {
    let months = period_sequence(at(2020, 11, 20, 0, 0), at(2021, 2, 3, 0, 0), Period::Month).unwrap();
    assert_eq!(
        months,
        vec![
            at(2020, 11, 1, 0, 0),
            at(2020, 12, 1, 0, 0),
            at(2021, 1, 1, 0, 0),
            at(2021, 2, 1, 0, 0),
        ]
    );
}

#[test]
fn leap_day_is_its_own_day() {
    let days = period_sequence(at(2020, 2, 28, 6, 0), at(2020, 3, 1, 6, 0), Period::Day).unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[1], at(2020, 2, 29, 0, 0));
}

#[test]
fn epoch_hours_survive_encoding() {
    for t in [at(2004, 1, 1, 0, 0), at(2021, 12, 31, 23, 0), at(1999, 6, 15, 12, 0)] {
        assert_eq!(from_hours_since_epoch(hours_since_epoch(t)).unwrap(), t);
    }
}
