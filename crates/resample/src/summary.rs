//! Coarser-period summaries built from a run of period aggregates.

use chrono::NaiveDateTime;
use ndarray::{Array2, Array3, Axis, Zip, stack};
use rainmax_calendar::Period;

use crate::aggregate::PeriodAggregate;
use crate::error::ResampleError;
use crate::field::Grid;
use crate::reduce::masked_argmax;

/// Max, time of max and mean total over a coarser period.
#[derive(Debug, Clone)]
pub struct PeriodSummary {
    period: Period,
    start: NaiveDateTime,
    grid: Grid,
    max: Array2<f32>,
    max_time: Array2<Option<NaiveDateTime>>,
    mean: Array2<f32>,
    latest: NaiveDateTime,
    n_contributing: usize,
}

impl PeriodSummary {
    /// Assemble a summary from previously computed parts.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::ShapeMismatch`] if any array does not match
    /// the grid.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        period: Period,
        start: NaiveDateTime,
        grid: Grid,
        max: Array2<f32>,
        max_time: Array2<Option<NaiveDateTime>>,
        mean: Array2<f32>,
        latest: NaiveDateTime,
        n_contributing: usize,
    ) -> Result<Self, ResampleError> {
        let (ny, nx) = grid.shape();
        for (field, dim) in [
            ("max", max.dim()),
            ("max_time", max_time.dim()),
            ("mean", mean.dim()),
        ] {
            if dim != (ny, nx) {
                return Err(ResampleError::ShapeMismatch {
                    field,
                    expected: vec![ny, nx],
                    got: vec![dim.0, dim.1],
                });
            }
        }
        Ok(Self {
            period,
            start,
            grid,
            max,
            max_time,
            mean,
            latest,
            n_contributing,
        })
    }

    /// Summary period.
    pub fn period(&self) -> Period {
        self.period
    }

    /// Start of the summary period.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Spatial grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Maximum of the contributing maxima.
    pub fn max(&self) -> &Array2<f32> {
        &self.max
    }

    /// Time of the maximum, taken from the winning aggregate.
    pub fn max_time(&self) -> &Array2<Option<NaiveDateTime>> {
        &self.max_time
    }

    /// Mean of the contributing totals, skipping missing.
    pub fn mean(&self) -> &Array2<f32> {
        &self.mean
    }

    /// Start of the latest contributing aggregate.
    pub fn latest(&self) -> NaiveDateTime {
        self.latest
    }

    /// Number of contributing aggregates.
    pub fn n_contributing(&self) -> usize {
        self.n_contributing
    }
}

/// Summarise `aggregates` into one [`PeriodSummary`] per `period`.
///
/// Aggregates must be in time order and share a grid. A cell's summary max
/// is masked only when every contributing max is missing.
///
/// # Errors
///
/// Returns [`ResampleError::EmptyField`] for an empty slice,
/// [`ResampleError::GridMismatch`] if grids differ, or
/// [`ResampleError::NonMonotonicTime`] if starts are out of order.
pub fn summarise(
    aggregates: &[PeriodAggregate],
    period: Period,
) -> Result<Vec<PeriodSummary>, ResampleError> {
    let first = aggregates.first().ok_or(ResampleError::EmptyField)?;
    for (i, pair) in aggregates.windows(2).enumerate() {
        if pair[1].start() <= pair[0].start() {
            return Err(ResampleError::NonMonotonicTime {
                index: i + 1,
                time: pair[1].start(),
            });
        }
        if pair[1].grid() != first.grid() {
            return Err(ResampleError::GridMismatch {
                reason: format!("aggregate for {} on a different grid", pair[1].start()),
            });
        }
    }

    let mut out = Vec::new();
    let mut rest = aggregates;
    while let Some(head) = rest.first() {
        let label = period.floor(head.start());
        let n = rest
            .iter()
            .take_while(|a| period.floor(a.start()) == label)
            .count();
        let (group, tail) = rest.split_at(n);
        out.push(summarise_group(group, period, label)?);
        rest = tail;
    }
    Ok(out)
}

fn summarise_group(
    group: &[PeriodAggregate],
    period: Period,
    start: NaiveDateTime,
) -> Result<PeriodSummary, ResampleError> {
    let maxes: Array3<f32> = stack_fields(group.iter().map(PeriodAggregate::max))?;
    let totals: Array3<f32> = stack_fields(group.iter().map(PeriodAggregate::total))?;
    let idx = masked_argmax(maxes.view());

    let grid = group[0].grid().clone();
    let mut max = Array2::from_elem(grid.shape(), f32::NAN);
    let mut max_time = Array2::from_elem(grid.shape(), None);
    Zip::indexed(&idx)
        .and(&mut max)
        .and(&mut max_time)
        .for_each(|(iy, ix), i, m, mt| {
            if let Some(k) = *i {
                *m = maxes[[k, iy, ix]];
                *mt = group[k].max_time()[[iy, ix]];
            }
        });

    let mut buf = Vec::with_capacity(group.len());
    let mean = Array2::from_shape_fn(grid.shape(), |(iy, ix)| {
        buf.clear();
        buf.extend(totals.slice(ndarray::s![.., iy, ix]).iter().copied());
        rainmax_stats::mean_skip(&buf)
    });

    let latest = group
        .iter()
        .map(PeriodAggregate::start)
        .max()
        .unwrap_or(start);

    Ok(PeriodSummary {
        period,
        start,
        grid,
        max,
        max_time,
        mean,
        latest,
        n_contributing: group.len(),
    })
}

fn stack_fields<'a>(
    fields: impl Iterator<Item = &'a Array2<f32>>,
) -> Result<Array3<f32>, ResampleError> {
    let views: Vec<_> = fields.map(Array2::view).collect();
    stack(Axis(0), &views).map_err(|e| ResampleError::GridMismatch {
        reason: e.to_string(),
    })
}
