//! Error types for rainmax-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the rainmax-io crate.
///
/// Covers file-system failures, archive and Nimrod decoding problems,
/// NetCDF library errors, and mismatches between stored data and the
/// in-memory field model.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file or directory does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Returned when a day archive cannot be unpacked.
    #[error("archive {}: {reason}", path.display())]
    Archive {
        /// Archive being read.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when a Nimrod image is malformed.
    #[error("nimrod decode error: {reason}")]
    Decode {
        /// Description of the malformed content.
        reason: String,
    },

    /// Returned when a required variable is not present in a file.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a time value cannot be decoded.
    #[error("invalid time: {reason}")]
    InvalidTime {
        /// Description of the time decoding issue.
        reason: String,
    },

    /// Wraps a file-system error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wraps an error from the field model.
    #[error(transparent)]
    Resample(#[from] rainmax_resample::ResampleError),

    /// Wraps an error from the rainmax-calendar crate.
    #[error(transparent)]
    Calendar(#[from] rainmax_calendar::CalendarError),
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}
