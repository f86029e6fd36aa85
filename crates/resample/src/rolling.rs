//! Trailing two-hour mean of hourly rates, with a carry across day files.

use chrono::TimeDelta;
use ndarray::{Array3, Axis, Zip};
use tracing::{debug, warn};

use crate::error::ResampleError;
use crate::field::RainField;

/// Attribute recording how the first two-hour value of a file was formed.
pub const TWO_HOUR_NOTES_ATTR: &str = "two_hr_notes";

/// Note written when the previous hour was unavailable.
pub const MISSING_PREVIOUS_DAY: &str = "Missing the previous day";

/// Trailing two-sample mean along time.
///
/// Output step `t` is the mean of steps `t - 1` and `t`, labelled by `t`.
/// Both samples are required, so the first step and any step next to a
/// missing value are missing.
pub fn two_hour_mean(hourly: &RainField) -> RainField {
    let data = hourly.data();
    let mut out = Array3::from_elem(data.raw_dim(), f32::NAN);
    for t in 1..hourly.n_times() {
        Zip::from(out.index_axis_mut(Axis(0), t))
            .and(data.index_axis(Axis(0), t - 1))
            .and(data.index_axis(Axis(0), t))
            .for_each(|o, &a, &b| *o = (a + b) / 2.0);
    }
    hourly.with_data(out)
}

/// Carries the last hour of one file into the two-hour mean of the next.
///
/// Without the carry the first hour of every file would be missing.
#[derive(Debug, Clone, Default)]
pub struct HourCarry {
    last: Option<RainField>,
}

impl HourCarry {
    /// Creates an empty carry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-hour mean of `hourly`, seeded with the remembered hour when it
    /// immediately precedes `hourly`.
    ///
    /// If there is no remembered hour, or it does not end exactly one hour
    /// before `hourly` starts, or it sits on another grid, the first step is
    /// left missing and the result is tagged with [`TWO_HOUR_NOTES_ATTR`].
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError`] if joining the remembered hour fails.
    pub fn roll(&self, hourly: &RainField) -> Result<RainField, ResampleError> {
        if let Some(prev) = &self.last
            && prev.last_time() + TimeDelta::hours(1) == hourly.first_time()
            && prev.grid() == hourly.grid()
        {
            let joined = prev.last_step().concat(hourly)?;
            let rolled = two_hour_mean(&joined);
            debug!(seam = %hourly.first_time(), "two-hour mean seeded from previous file");
            return rolled.select_times(1..rolled.n_times());
        }

        if let Some(prev) = &self.last {
            warn!(
                previous = %prev.last_time(),
                first = %hourly.first_time(),
                "previous hour not contiguous, first two-hour value missing"
            );
        }
        let mut rolled = two_hour_mean(hourly);
        rolled.set_attr(TWO_HOUR_NOTES_ATTR, MISSING_PREVIOUS_DAY);
        Ok(rolled)
    }

    /// Remembers the last hour of `hourly` for the next call to [`roll`](Self::roll).
    pub fn remember(&mut self, hourly: &RainField) {
        self.last = Some(hourly.last_step());
    }
}
