//! Gridded, time-stamped rainfall fields.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDateTime;
use ndarray::{Array3, ArrayView2, Axis, concatenate, s};

use crate::error::ResampleError;

/// Free-form string attributes carried alongside a field.
pub type Attrs = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Projected (British National Grid) cell-centre coordinates in metres.
///
/// `y` runs in row order, which for radar composites is north to south.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Grid {
    /// Create a grid from column (`x`) and row (`y`) coordinates.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    /// Build a regular grid from an origin and spacing.
    ///
    /// Column `j` sits at `x0 + j * dx`; row `i` at `y0 - i * dy`.
    pub fn regular(x0: f64, dx: f64, nx: usize, y0: f64, dy: f64, ny: usize) -> Self {
        let x = (0..nx).map(|j| x0 + j as f64 * dx).collect();
        let y = (0..ny).map(|i| y0 - i as f64 * dy).collect();
        Self { x, y }
    }

    /// Column coordinates.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Row coordinates.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Number of columns.
    pub fn nx(&self) -> usize {
        self.x.len()
    }

    /// Number of rows.
    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// `(ny, nx)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny(), self.nx())
    }

    /// Index ranges of the rows and columns that fall inside `region`.
    ///
    /// Returns `None` if the region selects no cells or the selected
    /// cells are not contiguous.
    fn select(&self, region: &Region) -> Option<(Range<usize>, Range<usize>)> {
        let rows = contiguous(&self.y, |v| region.y_min <= v && v <= region.y_max)?;
        let cols = contiguous(&self.x, |v| region.x_min <= v && v <= region.x_max)?;
        Some((rows, cols))
    }
}

fn contiguous(coords: &[f64], keep: impl Fn(f64) -> bool) -> Option<Range<usize>> {
    let first = coords.iter().position(|&v| keep(v))?;
    let last = coords.iter().rposition(|&v| keep(v))?;
    if coords[first..=last].iter().all(|&v| keep(v)) {
        Some(first..last + 1)
    } else {
        None
    }
}

/// Inclusive bounding box in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Western edge.
    pub x_min: f64,
    /// Eastern edge.
    pub x_max: f64,
    /// Southern edge.
    pub y_min: f64,
    /// Northern edge.
    pub y_max: f64,
}

// ---------------------------------------------------------------------------
// RainField
// ---------------------------------------------------------------------------

/// Rainfall rate (mm/hr) on a projected grid, one slice per timestamp.
///
/// `data` has shape `[time, y, x]`. Missing values are NaN. Timestamps are
/// strictly increasing.
#[derive(Debug, Clone)]
pub struct RainField {
    times: Vec<NaiveDateTime>,
    grid: Grid,
    data: Array3<f32>,
    attrs: Attrs,
}

impl RainField {
    /// Create a field after validating shape and time ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::EmptyField`] if `times` is empty,
    /// [`ResampleError::ShapeMismatch`] if `data` is not
    /// `[times.len(), grid.ny(), grid.nx()]`, or
    /// [`ResampleError::NonMonotonicTime`] if timestamps do not increase.
    pub fn new(
        times: Vec<NaiveDateTime>,
        grid: Grid,
        data: Array3<f32>,
    ) -> Result<Self, ResampleError> {
        if times.is_empty() {
            return Err(ResampleError::EmptyField);
        }
        let expected = [times.len(), grid.ny(), grid.nx()];
        if data.shape() != &expected[..] {
            return Err(ResampleError::ShapeMismatch {
                field: "data",
                expected: expected.to_vec(),
                got: data.shape().to_vec(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ResampleError::NonMonotonicTime {
                index: i + 1,
                time: times[i + 1],
            });
        }
        Ok(Self {
            times,
            grid,
            data,
            attrs: Attrs::new(),
        })
    }

    /// Replace the attribute map.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Timestamps, one per slice.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Spatial grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Rainfall rates, `[time, y, x]`.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Rainfall rates at time step `t`.
    pub fn slice(&self, t: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), t)
    }

    /// Attributes.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Look up a single attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Set a single attribute, replacing any previous value.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Number of time steps.
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// First timestamp.
    pub fn first_time(&self) -> NaiveDateTime {
        self.times[0]
    }

    /// Last timestamp.
    pub fn last_time(&self) -> NaiveDateTime {
        self.times[self.times.len() - 1]
    }

    /// Same times, grid and attributes with new values.
    pub(crate) fn with_data(&self, data: Array3<f32>) -> Self {
        Self {
            times: self.times.clone(),
            grid: self.grid.clone(),
            data,
            attrs: self.attrs.clone(),
        }
    }

    /// Apply `f` to every value, keeping times, grid and attributes.
    pub fn map_values(&self, f: impl Fn(f32) -> f32) -> Self {
        self.with_data(self.data.mapv(f))
    }

    /// Sub-field covering time steps `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::EmptyField`] if the range is empty or out
    /// of bounds.
    pub fn select_times(&self, range: Range<usize>) -> Result<Self, ResampleError> {
        if range.is_empty() || range.end > self.n_times() {
            return Err(ResampleError::EmptyField);
        }
        Ok(Self {
            times: self.times[range.clone()].to_vec(),
            grid: self.grid.clone(),
            data: self.data.slice(s![range, .., ..]).to_owned(),
            attrs: self.attrs.clone(),
        })
    }

    /// Single-step field holding only the last time step.
    pub fn last_step(&self) -> Self {
        let n = self.n_times();
        Self {
            times: vec![self.times[n - 1]],
            grid: self.grid.clone(),
            data: self.data.slice(s![n - 1..n, .., ..]).to_owned(),
            attrs: self.attrs.clone(),
        }
    }

    /// Sub-field restricted to the cells inside `region`.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::GridMismatch`] if no contiguous block of
    /// cells lies inside the region.
    pub fn select_region(&self, region: &Region) -> Result<Self, ResampleError> {
        let (rows, cols) = self
            .grid
            .select(region)
            .ok_or_else(|| ResampleError::GridMismatch {
                reason: format!("no contiguous cells inside {region:?}"),
            })?;
        let grid = Grid::new(
            self.grid.x[cols.clone()].to_vec(),
            self.grid.y[rows.clone()].to_vec(),
        );
        Ok(Self {
            times: self.times.clone(),
            grid,
            data: self.data.slice(s![.., rows, cols]).to_owned(),
            attrs: self.attrs.clone(),
        })
    }

    /// Join `self` and `later` along time. Attributes come from `later`.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::GridMismatch`] if the grids differ, or
    /// [`ResampleError::NonMonotonicTime`] if `later` does not start after
    /// `self` ends.
    pub fn concat(&self, later: &Self) -> Result<Self, ResampleError> {
        if self.grid != later.grid {
            return Err(ResampleError::GridMismatch {
                reason: format!(
                    "cannot join {:?} grid onto {:?} grid",
                    later.grid.shape(),
                    self.grid.shape()
                ),
            });
        }
        let mut times = self.times.clone();
        times.extend_from_slice(&later.times);
        let data = concatenate(Axis(0), &[self.data.view(), later.data.view()]).map_err(|e| {
            ResampleError::GridMismatch {
                reason: e.to_string(),
            }
        })?;
        Ok(Self::new(times, later.grid.clone(), data)?.with_attrs(later.attrs.clone()))
    }

    /// Copy the time series of cell `(iy, ix)` into `buf`.
    pub(crate) fn cell_series(&self, iy: usize, ix: usize, buf: &mut Vec<f32>) {
        buf.clear();
        buf.extend(self.data.slice(s![.., iy, ix]).iter().copied());
    }
}
