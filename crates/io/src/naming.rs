//! Output file names derived from day-archive names.
//!
//! Archive names look like
//! `metoffice-c-band-rain-radar_uk_20210712_5km-composite.dat.gz.tar`.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::discover::ARCHIVE_SUFFIX;

fn file_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Underscore-separated parts of the name before its first `.`.
fn stem_parts(input: &Path) -> Vec<String> {
    let name = file_name(input);
    let stem = name.split('.').next().unwrap_or_default();
    stem.split('_').map(str::to_string).collect()
}

fn replace_suffix(input: &Path, suffix: &str) -> String {
    let name = file_name(input);
    match name.strip_suffix(ARCHIVE_SUFFIX) {
        Some(base) => format!("{base}{suffix}"),
        None => format!("{}{suffix}", name.split('.').next().unwrap_or_default()),
    }
}

/// `<stem>_max.nc`: daily max and hour of max for one archive.
pub fn daily_max_name(input: &Path) -> String {
    replace_suffix(input, "_max.nc")
}

/// `<stem>_total.nc`: daily total for one archive.
pub fn daily_total_name(input: &Path) -> String {
    replace_suffix(input, "_total.nc")
}

/// `<source>_<region>_<year>_<resolution>_max.nc`: annual summary.
pub fn annual_max_name(input: &Path, year: i32, resolution: &str) -> String {
    let parts = stem_parts(input);
    let prefix = parts.iter().take(2).cloned().collect::<Vec<_>>().join("_");
    format!("{prefix}_{year:04}_{resolution}_max.nc")
}

/// `<source>_<region>_<YYYY-MM>_<product>_<kind><extra>.nc`: monthly
/// aggregator output for the period containing `start`.
///
/// `kind` is `daily` for the buffered days or `monthly` for the summary;
/// `extra` distinguishes variants such as `2hr`.
pub fn period_file_name(input: &Path, start: NaiveDateTime, kind: &str, extra: &str) -> String {
    let parts = stem_parts(input);
    let month = start.format("%Y-%m");
    match parts.as_slice() {
        [a, b, .., last] => format!("{a}_{b}_{month}_{last}_{kind}{extra}.nc"),
        _ => format!("{}_{month}_{kind}{extra}.nc", parts.join("_")),
    }
}
