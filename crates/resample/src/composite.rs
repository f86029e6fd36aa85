//! Multi-year composite of annual summaries.

use chrono::Datelike;
use ndarray::{Array2, Array3, Axis, Zip, s, stack};

use crate::error::ResampleError;
use crate::field::Grid;
use crate::reduce::masked_argmax;
use crate::summary::PeriodSummary;

/// Per-cell statistics of the maxima across a run of summaries.
#[derive(Debug, Clone)]
pub struct Composite {
    grid: Grid,
    median: Array2<f32>,
    max: Array2<f32>,
    year_of_max: Array2<Option<i32>>,
    n_periods: usize,
}

impl Composite {
    /// Spatial grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Median of the summary maxima, skipping missing.
    pub fn median(&self) -> &Array2<f32> {
        &self.median
    }

    /// Largest summary maximum.
    pub fn max(&self) -> &Array2<f32> {
        &self.max
    }

    /// Calendar year in which the largest maximum occurred.
    pub fn year_of_max(&self) -> &Array2<Option<i32>> {
        &self.year_of_max
    }

    /// Number of summaries combined.
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }
}

/// Combine summaries (typically one per year) into a [`Composite`].
///
/// # Errors
///
/// Returns [`ResampleError::EmptyField`] for an empty slice or
/// [`ResampleError::GridMismatch`] if the summaries sit on different grids.
pub fn composite(summaries: &[PeriodSummary]) -> Result<Composite, ResampleError> {
    let first = summaries.first().ok_or(ResampleError::EmptyField)?;
    if let Some(other) = summaries.iter().find(|s| s.grid() != first.grid()) {
        return Err(ResampleError::GridMismatch {
            reason: format!("summary for {} on a different grid", other.start()),
        });
    }

    let views: Vec<_> = summaries.iter().map(|s| s.max().view()).collect();
    let maxes: Array3<f32> = stack(Axis(0), &views).map_err(|e| ResampleError::GridMismatch {
        reason: e.to_string(),
    })?;
    let idx = masked_argmax(maxes.view());

    let shape = first.grid().shape();
    let mut max = Array2::from_elem(shape, f32::NAN);
    let mut year_of_max = Array2::from_elem(shape, None);
    Zip::indexed(&idx)
        .and(&mut max)
        .and(&mut year_of_max)
        .for_each(|(iy, ix), i, m, y| {
            if let Some(k) = *i {
                *m = maxes[[k, iy, ix]];
                *y = summaries[k].max_time()[[iy, ix]].map(|t| t.year());
            }
        });

    let mut buf = Vec::with_capacity(summaries.len());
    let median = Array2::from_shape_fn(shape, |(iy, ix)| {
        buf.clear();
        buf.extend(maxes.slice(s![.., iy, ix]).iter().copied());
        rainmax_stats::median_skip(&buf)
    });

    Ok(Composite {
        grid: first.grid().clone(),
        median,
        max,
        year_of_max,
        n_periods: summaries.len(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use rainmax_calendar::Period;

    use super::*;

    fn jan1(year: i32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn annual(year: i32, max: [f32; 2]) -> PeriodSummary {
        let grid = Grid::regular(0.0, 1.0, 2, 0.0, 1.0, 1);
        let max = Array2::from_shape_vec((1, 2), max.to_vec()).unwrap();
        let t = NaiveDate::from_ymd_opt(year, 7, 12)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let max_time = max.mapv(|v: f32| (!v.is_nan()).then_some(t));
        PeriodSummary::from_parts(
            Period::Year,
            jan1(year),
            grid,
            max,
            max_time,
            Array2::zeros((1, 2)),
            jan1(year),
            365,
        )
        .unwrap()
    }

    #[test]
    fn median_max_and_year() {
        let years = [
            annual(2019, [3.0, f32::NAN]),
            annual(2020, [9.0, f32::NAN]),
            annual(2021, [5.0, f32::NAN]),
        ];
        let c = composite(&years).unwrap();
        assert_abs_diff_eq!(c.median()[[0, 0]], 5.0);
        assert_abs_diff_eq!(c.max()[[0, 0]], 9.0);
        assert_eq!(c.year_of_max()[[0, 0]], Some(2020));
        assert_eq!(c.n_periods(), 3);
    }

    #[test]
    fn all_missing_cell_is_masked() {
        let c = composite(&[annual(2020, [1.0, f32::NAN])]).unwrap();
        assert!(c.max()[[0, 1]].is_nan());
        assert!(c.median()[[0, 1]].is_nan());
        assert_eq!(c.year_of_max()[[0, 1]], None);
    }

    #[test]
    fn empty_is_error() {
        assert!(matches!(composite(&[]), Err(ResampleError::EmptyField)));
    }
}
