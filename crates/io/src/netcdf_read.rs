//! Low-level NetCDF extraction helpers.

use std::path::Path;

use chrono::NaiveDateTime;
use rainmax_calendar::from_hours_since_epoch;

use crate::error::IoError;

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, IoError> {
    file.variable(name).ok_or_else(|| IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a 1-D `f64` variable.
pub(crate) fn read_1d_f64(file: &netcdf::File, name: &str, path: &Path) -> Result<Vec<f64>, IoError> {
    Ok(variable(file, name, path)?.get_values::<f64, _>(..)?)
}

/// Read a 1-D `i32` variable.
pub(crate) fn read_1d_i32(file: &netcdf::File, name: &str, path: &Path) -> Result<Vec<i32>, IoError> {
    Ok(variable(file, name, path)?.get_values::<i32, _>(..)?)
}

/// Read a 3-D variable as `f32` and check its shape against `expected`
/// (`[nt, ny, nx]`).
pub(crate) fn read_3d_f32(
    file: &netcdf::File,
    name: &str,
    path: &Path,
    expected: [usize; 3],
) -> Result<Vec<f32>, IoError> {
    let var = variable(file, name, path)?;
    check_dims(&var, name, expected)?;
    Ok(var.get_values::<f32, _>(..)?)
}

/// Read a 3-D variable as `f64` and check its shape against `expected`.
pub(crate) fn read_3d_f64(
    file: &netcdf::File,
    name: &str,
    path: &Path,
    expected: [usize; 3],
) -> Result<Vec<f64>, IoError> {
    let var = variable(file, name, path)?;
    check_dims(&var, name, expected)?;
    Ok(var.get_values::<f64, _>(..)?)
}

fn check_dims(var: &netcdf::Variable<'_>, name: &str, expected: [usize; 3]) -> Result<(), IoError> {
    let dims = var.dimensions();
    if dims.len() != 3 {
        return Err(IoError::DimensionMismatch {
            name: format!("{name} dimensions"),
            expected: 3,
            got: dims.len(),
        });
    }
    for (dim, want) in dims.iter().zip(expected) {
        if dim.len() != want {
            return Err(IoError::DimensionMismatch {
                name: format!("{name}:{}", dim.name()),
                expected: want,
                got: dim.len(),
            });
        }
    }
    Ok(())
}

/// Decode hours since the epoch; NaN decodes to `None`.
pub(crate) fn decode_time(hours: f64) -> Result<Option<NaiveDateTime>, IoError> {
    if hours.is_nan() {
        return Ok(None);
    }
    from_hours_since_epoch(hours)
        .map(Some)
        .map_err(|e| IoError::InvalidTime {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn decode_nan_is_none() {
        assert_eq!(decode_time(f64::NAN).unwrap(), None);
    }

    #[test]
    fn decode_hours() {
        let t = NaiveDate::from_ymd_opt(1970, 1, 2)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        assert_eq!(decode_time(25.0).unwrap(), Some(t));
    }

    #[test]
    fn decode_infinite_is_error() {
        assert!(matches!(
            decode_time(f64::INFINITY),
            Err(IoError::InvalidTime { .. })
        ));
    }

    #[test]
    fn open_missing_file() {
        let err = open_file(Path::new("/no/such/file.nc")).unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
