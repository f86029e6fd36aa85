//! Error types for the rainmax-resample crate.

use chrono::NaiveDateTime;

/// Error type for all fallible operations in the rainmax-resample crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResampleError {
    /// Returned when a field or aggregate list has no time steps.
    #[error("input field has no time steps")]
    EmptyField,

    /// Returned when array dimensions disagree with their coordinates.
    #[error("{field}: expected shape {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Name of the mismatched array.
        field: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Returned when timestamps are not strictly increasing.
    #[error("timestamps not strictly increasing at index {index} ({time})")]
    NonMonotonicTime {
        /// Index of the first out-of-order timestamp.
        index: usize,
        /// The offending timestamp.
        time: NaiveDateTime,
    },

    /// Returned when two fields or aggregates sit on different grids.
    #[error("grid mismatch: {reason}")]
    GridMismatch {
        /// Description of the difference.
        reason: String,
    },

    /// Returned when an aggregate is pushed into a rollup for another period.
    #[error("aggregate for {got} pushed into rollup accumulating {expected}")]
    PeriodMismatch {
        /// Start of the period being accumulated.
        expected: NaiveDateTime,
        /// Start of the period the rejected aggregate belongs to.
        got: NaiveDateTime,
    },

    /// Returned when configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Calendar error.
    #[error(transparent)]
    Calendar(#[from] rainmax_calendar::CalendarError),
}
