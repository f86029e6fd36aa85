//! Low-level NetCDF writing helpers.

use std::path::Path;

use chrono::NaiveDateTime;
use ndarray::Array2;
use netcdf::FileMut;
use rainmax_calendar::{TIME_UNITS, hours_since_epoch};
use rainmax_resample::{Attrs, Grid};

use crate::error::IoError;

pub(crate) const TIME_DIM: &str = "time";
pub(crate) const X_DIM: &str = "projection_x_coordinate";
pub(crate) const Y_DIM: &str = "projection_y_coordinate";
pub(crate) const GRID_MAPPING: &str = "transverse_mercator";
pub(crate) const MAX_TIME_ATTR: &str = "max_time";

/// British National Grid (OSGB 1936) transverse Mercator parameters.
const OSGB_PARAMS: [(&str, f64); 7] = [
    ("longitude_of_central_meridian", -2.0),
    ("latitude_of_projection_origin", 49.0),
    ("scale_factor_at_central_meridian", 0.999_601_271_7),
    ("false_easting", 400_000.0),
    ("false_northing", -100_000.0),
    ("semi_major_axis", 6_377_563.396),
    ("semi_minor_axis", 6_356_256.909),
];

/// Deflate settings applied to every data variable.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deflate {
    pub level: i32,
    pub shuffle: bool,
}

/// Create a NetCDF-4 file with global metadata.
pub(crate) fn create_file(path: &Path) -> Result<FileMut, IoError> {
    let mut file = netcdf::create(path)?;
    file.add_attribute("Conventions", "CF-1.7")?;
    file.add_attribute("source", "UK Nimrod radar composite")?;
    Ok(file)
}

/// Copy string attributes onto the file.
pub(crate) fn put_global_attrs(file: &mut FileMut, attrs: &Attrs) -> Result<(), IoError> {
    for (k, v) in attrs {
        file.add_attribute(k, v.as_str())?;
    }
    Ok(())
}

/// Add the spatial dimensions, their coordinate variables and the grid
/// mapping variable.
pub(crate) fn put_grid(file: &mut FileMut, grid: &Grid) -> Result<(), IoError> {
    file.add_dimension(Y_DIM, grid.ny())?;
    file.add_dimension(X_DIM, grid.nx())?;

    for (name, coords) in [(X_DIM, grid.x()), (Y_DIM, grid.y())] {
        let mut var = file.add_variable::<f64>(name, &[name])?;
        var.put_attribute("standard_name", name)?;
        var.put_attribute("units", "m")?;
        var.put_values(coords, ..)?;
    }

    let mut gm = file.add_variable::<i32>(GRID_MAPPING, &[])?;
    gm.put_attribute("grid_mapping_name", "transverse_mercator")?;
    for (name, value) in OSGB_PARAMS {
        gm.put_attribute(name, value)?;
    }
    Ok(())
}

/// Add the time dimension and coordinate variable.
pub(crate) fn put_time_axis(file: &mut FileMut, times: &[NaiveDateTime]) -> Result<(), IoError> {
    file.add_dimension(TIME_DIM, times.len())?;
    let hours: Vec<f64> = times.iter().copied().map(hours_since_epoch).collect();
    let mut var = file.add_variable::<f64>(TIME_DIM, &[TIME_DIM])?;
    var.put_attribute("standard_name", "time")?;
    var.put_attribute("units", TIME_UNITS)?;
    var.put_attribute("calendar", "gregorian")?;
    var.put_values(&hours, ..)?;
    Ok(())
}

/// Write a compressed `f32` grid variable over `[time, y, x]` from one
/// array per time step.
pub(crate) fn put_field(
    file: &mut FileMut,
    name: &str,
    units: &str,
    fields: &[&Array2<f32>],
    deflate: Deflate,
) -> Result<(), IoError> {
    let values: Vec<f32> = fields.iter().flat_map(|a| a.iter().copied()).collect();
    let mut var = file.add_variable::<f32>(name, &[TIME_DIM, Y_DIM, X_DIM])?;
    var.set_compression(deflate.level, deflate.shuffle)?;
    var.put_attribute("_FillValue", f32::NAN)?;
    var.put_attribute("units", units)?;
    var.put_attribute("grid_mapping", GRID_MAPPING)?;
    var.put_values(&values, ..)?;
    Ok(())
}

/// Write a compressed time-valued grid variable, encoded as hours since the
/// epoch with NaN for missing.
pub(crate) fn put_time_field(
    file: &mut FileMut,
    name: &str,
    fields: &[&Array2<Option<NaiveDateTime>>],
    deflate: Deflate,
) -> Result<(), IoError> {
    let values: Vec<f64> = fields
        .iter()
        .flat_map(|a| a.iter().map(|t| t.map_or(f64::NAN, hours_since_epoch)))
        .collect();
    let mut var = file.add_variable::<f64>(name, &[TIME_DIM, Y_DIM, X_DIM])?;
    var.set_compression(deflate.level, deflate.shuffle)?;
    var.put_attribute("_FillValue", f64::NAN)?;
    var.put_attribute("units", TIME_UNITS)?;
    var.put_attribute("calendar", "gregorian")?;
    var.put_attribute("grid_mapping", GRID_MAPPING)?;
    var.put_values(&values, ..)?;
    Ok(())
}

/// Write a 1-D time variable (hours since the epoch) over `time`.
pub(crate) fn put_time_series(
    file: &mut FileMut,
    name: &str,
    times: &[NaiveDateTime],
) -> Result<(), IoError> {
    let hours: Vec<f64> = times.iter().copied().map(hours_since_epoch).collect();
    let mut var = file.add_variable::<f64>(name, &[TIME_DIM])?;
    var.put_attribute("units", TIME_UNITS)?;
    var.put_attribute("calendar", "gregorian")?;
    var.put_values(&hours, ..)?;
    Ok(())
}

/// Write a 1-D count variable over `time`.
pub(crate) fn put_count_series(
    file: &mut FileMut,
    name: &str,
    counts: &[i32],
) -> Result<(), IoError> {
    let mut var = file.add_variable::<i32>(name, &[TIME_DIM])?;
    var.put_attribute("units", "1")?;
    var.put_values(counts, ..)?;
    Ok(())
}

/// Write a compressed 2-D `f32` variable over `[y, x]`.
pub(crate) fn put_map(
    file: &mut FileMut,
    name: &str,
    units: &str,
    field: &Array2<f32>,
    deflate: Deflate,
) -> Result<(), IoError> {
    let values: Vec<f32> = field.iter().copied().collect();
    let mut var = file.add_variable::<f32>(name, &[Y_DIM, X_DIM])?;
    var.set_compression(deflate.level, deflate.shuffle)?;
    var.put_attribute("_FillValue", f32::NAN)?;
    var.put_attribute("units", units)?;
    var.put_attribute("grid_mapping", GRID_MAPPING)?;
    var.put_values(&values, ..)?;
    Ok(())
}

/// Fill value for integer year maps.
pub(crate) const YEAR_FILL: i32 = -9999;

/// Write a compressed 2-D `i32` year variable over `[y, x]`.
pub(crate) fn put_year_map(
    file: &mut FileMut,
    name: &str,
    field: &Array2<Option<i32>>,
    deflate: Deflate,
) -> Result<(), IoError> {
    let values: Vec<i32> = field.iter().map(|y| y.unwrap_or(YEAR_FILL)).collect();
    let mut var = file.add_variable::<i32>(name, &[Y_DIM, X_DIM])?;
    var.set_compression(deflate.level, deflate.shuffle)?;
    var.put_attribute("_FillValue", YEAR_FILL)?;
    var.put_attribute("grid_mapping", GRID_MAPPING)?;
    var.put_values(&values, ..)?;
    Ok(())
}
