//! Reading summary files back into [`PeriodSummary`] values.

use std::path::Path;

use ndarray::{Array2, Array3};
use rainmax_calendar::Period;
use rainmax_resample::{Grid, PeriodSummary};
use tracing::debug;

use crate::error::IoError;
use crate::netcdf_read::{decode_time, open_file, read_1d_f64, read_1d_i32, read_3d_f32, read_3d_f64};
use crate::netcdf_write::{TIME_DIM, X_DIM, Y_DIM};

/// Read the `period` summaries stored in `path`, one per time step.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::MissingVariable`],
/// [`IoError::DimensionMismatch`] or [`IoError::InvalidTime`] when the file
/// does not hold a summary of the expected layout.
pub fn read_summary(path: &Path, period: Period) -> Result<Vec<PeriodSummary>, IoError> {
    let file = open_file(path)?;
    let p = period.name();

    let grid = Grid::new(
        read_1d_f64(&file, X_DIM, path)?,
        read_1d_f64(&file, Y_DIM, path)?,
    );
    let starts = read_1d_f64(&file, TIME_DIM, path)?;
    let (nt, (ny, nx)) = (starts.len(), grid.shape());
    let shape = [nt, ny, nx];

    let max = to_array(read_3d_f32(&file, &format!("{p}Max"), path, shape)?, shape)?;
    let mean = to_array(read_3d_f32(&file, &format!("{p}Mean"), path, shape)?, shape)?;
    let max_time = read_3d_f64(&file, &format!("{p}MaxTime"), path, shape)?
        .into_iter()
        .map(decode_time)
        .collect::<Result<Vec<_>, _>>()?;
    let max_time = Array3::from_shape_vec(shape, max_time).map_err(|e| shape_err(&e))?;
    let counts = read_1d_i32(&file, &format!("{p}Count"), path)?;
    let latest = read_1d_f64(&file, &format!("{p}Latest"), path)?;
    for (name, len) in [("count", counts.len()), ("latest", latest.len())] {
        if len != nt {
            return Err(IoError::DimensionMismatch {
                name: format!("{p} {name}"),
                expected: nt,
                got: len,
            });
        }
    }

    let mut out = Vec::with_capacity(nt);
    for t in 0..nt {
        let missing = |what: &str| IoError::InvalidTime {
            reason: format!("missing {what} for step {t} in {}", path.display()),
        };
        let start = decode_time(starts[t])?.ok_or_else(|| missing("start"))?;
        let last = decode_time(latest[t])?.ok_or_else(|| missing("latest time"))?;
        out.push(PeriodSummary::from_parts(
            period,
            start,
            grid.clone(),
            slice(&max, t),
            slice(&max_time, t),
            slice(&mean, t),
            last,
            usize::try_from(counts[t]).unwrap_or(0),
        )?);
    }
    debug!(path = %path.display(), n = out.len(), "read {p} summaries");
    Ok(out)
}

fn to_array(values: Vec<f32>, shape: [usize; 3]) -> Result<Array3<f32>, IoError> {
    Array3::from_shape_vec(shape, values).map_err(|e| shape_err(&e))
}

fn slice<T: Clone>(a: &Array3<T>, t: usize) -> Array2<T> {
    a.index_axis(ndarray::Axis(0), t).to_owned()
}

fn shape_err(e: &ndarray::ShapeError) -> IoError {
    IoError::Netcdf {
        reason: format!("summary grid: {e}"),
    }
}
