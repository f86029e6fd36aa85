//! Per-cell maximum and time-of-maximum over the time axis.
//!
//! The reduction runs in two phases. First an index of the maximum is taken
//! for every cell unconditionally; that index exists even when every sample
//! is missing. Then cells whose samples are all missing are masked, so they
//! never report a fabricated value or timestamp.

use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView3, Zip};

use crate::error::ResampleError;

/// Per-cell index of the maximum along axis 0 of `key`, or `None` where
/// every sample is missing.
pub fn masked_argmax(key: ArrayView3<'_, f32>) -> Array2<Option<usize>> {
    let (_, ny, nx) = key.dim();
    let mut buf = Vec::with_capacity(key.len_of(ndarray::Axis(0)));
    Array2::from_shape_fn((ny, nx), |(iy, ix)| {
        buf.clear();
        buf.extend(key.slice(ndarray::s![.., iy, ix]).iter().copied());
        let idx = rainmax_stats::blind_argmax(&buf);
        let bad = rainmax_stats::all_missing(&buf);
        (!bad).then_some(idx)
    })
}

/// Per-cell maximum and the timestamp at which it occurs.
#[derive(Debug, Clone)]
pub struct MaxReduction {
    max: Array2<f32>,
    max_time: Array2<Option<NaiveDateTime>>,
}

impl MaxReduction {
    /// Maximum value per cell; NaN where all samples were missing.
    pub fn max(&self) -> &Array2<f32> {
        &self.max
    }

    /// Time of the maximum per cell; `None` where all samples were missing.
    pub fn max_time(&self) -> &Array2<Option<NaiveDateTime>> {
        &self.max_time
    }

    /// Split into `(max, max_time)`.
    pub fn into_parts(self) -> (Array2<f32>, Array2<Option<NaiveDateTime>>) {
        (self.max, self.max_time)
    }
}

/// Reduce `values` (`[time, y, x]`) to per-cell maxima and their timestamps.
///
/// Ties resolve to the earliest timestamp.
///
/// # Errors
///
/// Returns [`ResampleError::ShapeMismatch`] if `times` does not match the
/// time axis of `values`.
pub fn reduce_max(
    values: ArrayView3<'_, f32>,
    times: &[NaiveDateTime],
) -> Result<MaxReduction, ResampleError> {
    let (nt, ny, nx) = values.dim();
    if times.len() != nt {
        return Err(ResampleError::ShapeMismatch {
            field: "times",
            expected: vec![nt],
            got: vec![times.len()],
        });
    }
    let idx = masked_argmax(values);

    let mut max = Array2::from_elem((ny, nx), f32::NAN);
    let mut max_time = Array2::from_elem((ny, nx), None);
    Zip::indexed(&idx)
        .and(&mut max)
        .and(&mut max_time)
        .for_each(|(iy, ix), i, m, mt| {
            if let Some(k) = *i {
                *m = values[[k, iy, ix]];
                *mt = Some(times[k]);
            }
        });
    Ok(MaxReduction { max, max_time })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};
    use ndarray::Array3;

    use super::*;

    const NAN: f32 = f32::NAN;

    fn hours(n: usize) -> Vec<NaiveDateTime> {
        let t0 = NaiveDate::from_ymd_opt(2021, 7, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n as i64).map(|h| t0 + TimeDelta::hours(h)).collect()
    }

    fn column(values: &[f32]) -> Array3<f32> {
        Array3::from_shape_vec((values.len(), 1, 1), values.to_vec()).unwrap()
    }

    #[test]
    fn all_missing_is_masked() {
        let v = column(&[NAN, NAN, NAN]);
        let r = reduce_max(v.view(), &hours(3)).unwrap();
        assert!(r.max()[[0, 0]].is_nan());
        assert_eq!(r.max_time()[[0, 0]], None);
    }

    #[test]
    fn single_present_sample_wins() {
        let times = hours(5);
        let v = column(&[NAN, NAN, NAN, 2.5, NAN]);
        let r = reduce_max(v.view(), &times).unwrap();
        assert_eq!(r.max()[[0, 0]], 2.5);
        assert_eq!(r.max_time()[[0, 0]], Some(times[3]));
    }

    #[test]
    fn trailing_missing_does_not_corrupt_index() {
        let times = hours(3);
        let v = column(&[1.0, 4.0, NAN]);
        let r = reduce_max(v.view(), &times).unwrap();
        assert_eq!(r.max()[[0, 0]], 4.0);
        assert_eq!(r.max_time()[[0, 0]], Some(times[1]));
    }

    #[test]
    fn ties_take_earliest() {
        let times = hours(4);
        let v = column(&[0.0, 3.0, 1.0, 3.0]);
        let r = reduce_max(v.view(), &times).unwrap();
        assert_eq!(r.max_time()[[0, 0]], Some(times[1]));
    }

    #[test]
    fn cells_are_independent() {
        let times = hours(2);
        let v = Array3::from_shape_vec((2, 1, 2), vec![NAN, 1.0, NAN, 5.0]).unwrap();
        let r = reduce_max(v.view(), &times).unwrap();
        assert_eq!(r.max_time()[[0, 0]], None);
        assert_eq!(r.max_time()[[0, 1]], Some(times[1]));
        assert_eq!(r.max()[[0, 1]], 5.0);
    }

    #[test]
    fn masked_argmax_reports_none() {
        let v = Array3::from_shape_vec((2, 1, 2), vec![NAN, 0.0, NAN, 0.0]).unwrap();
        let idx = masked_argmax(v.view());
        assert_eq!(idx[[0, 0]], None);
        assert_eq!(idx[[0, 1]], Some(0));
    }

    #[test]
    fn times_length_checked() {
        let v = column(&[1.0, 2.0]);
        assert!(reduce_max(v.view(), &hours(3)).is_err());
    }
}
