//! Locating per-day composite archives on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::IoError;

/// Suffix of a day archive: a tar of gzipped Nimrod files.
pub const ARCHIVE_SUFFIX: &str = ".dat.gz.tar";

/// Directory holding one year of composites at `resolution`
/// (`<root>/uk-<resolution>/<year>`).
pub fn year_dir(data_root: &Path, resolution: &str, year: i32) -> PathBuf {
    data_root
        .join(format!("uk-{resolution}"))
        .join(format!("{year:04}"))
}

/// Glob pattern for the day archives of `year` whose month matches
/// `month_glob` (e.g. `0[6-8]`).
pub fn month_pattern(year: i32, month_glob: &str) -> String {
    format!("*{year:04}{month_glob}[0-3][0-9]*-composite{ARCHIVE_SUFFIX}")
}

/// Glob pattern for the day archives of `year`, with `file_pattern`
/// matching the `MMDD_...` remainder of the name.
pub fn year_pattern(year: i32, file_pattern: &str) -> String {
    format!("*{year:04}{file_pattern}")
}

/// Sorted list of files in `dir` matching the glob `pattern`.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if `dir` does not exist, or
/// [`IoError::Archive`] if `pattern` is not a valid glob.
pub fn find_day_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, IoError> {
    if !dir.is_dir() {
        return Err(IoError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }
    let full = dir.join(pattern);
    let bad_pattern = |reason: String| IoError::Archive {
        path: full.clone(),
        reason,
    };
    let mut files: Vec<PathBuf> = glob::glob(&full.to_string_lossy())
        .map_err(|e| bad_pattern(e.to_string()))?
        .filter_map(|entry| match entry {
            Ok(p) if p.is_file() => Some(p),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .collect();
    files.sort();
    debug!(dir = %dir.display(), pattern, n = files.len(), "found day files");
    Ok(files)
}

/// Warn if `files` does not hold `expected` entries. Returns `true` when the
/// count matches.
pub fn check_file_count(year: i32, files: &[PathBuf], expected: usize) -> bool {
    if files.len() == expected {
        return true;
    }
    warn!(year, expected, got = files.len(), "unexpected number of day files");
    false
}
