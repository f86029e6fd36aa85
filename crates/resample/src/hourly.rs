//! Resampling sub-hourly composites to hourly mean rates.

use ndarray::Array3;
use rainmax_calendar::{Period, is_on_the_hour, period_sequence};
use tracing::debug;

use crate::error::ResampleError;
use crate::field::RainField;

/// Configuration for hourly resampling.
///
/// `min_samples` is the number of non-missing sub-hourly samples a cell
/// needs before its hourly mean counts as present. The default of 1 accepts
/// an hour backed by a single sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyConfig {
    min_samples: usize,
}

impl Default for HourlyConfig {
    fn default() -> Self {
        Self { min_samples: 1 }
    }
}

impl HourlyConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum number of present samples per hour.
    pub fn with_min_samples(mut self, n: usize) -> Self {
        self.min_samples = n;
        self
    }

    /// Returns the minimum number of present samples per hour.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ResampleError> {
        if self.min_samples == 0 {
            return Err(ResampleError::InvalidConfig {
                reason: "min_samples must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Average each clock hour of `field` into one slice labelled by the hour start.
///
/// Every hour between the first and last sample appears in the output;
/// hours without samples are missing. Attributes and grid are preserved.
///
/// # Errors
///
/// Returns [`ResampleError::InvalidConfig`] for an invalid `config`.
pub fn hourly_means(field: &RainField, config: &HourlyConfig) -> Result<RainField, ResampleError> {
    config.validate()?;

    let hours = period_sequence(field.first_time(), field.last_time(), Period::Hour)?;
    let (ny, nx) = field.grid().shape();
    let mut data = Array3::from_elem((hours.len(), ny, nx), f32::NAN);

    // Samples are sorted, so each hour owns a contiguous run.
    let mut start = 0;
    let mut buf = Vec::new();
    for (h, &hour) in hours.iter().enumerate() {
        let end = start
            + field.times()[start..]
                .iter()
                .take_while(|&&t| Period::Hour.floor(t) == hour)
                .count();
        if end == start {
            continue;
        }
        for iy in 0..ny {
            for ix in 0..nx {
                buf.clear();
                buf.extend((start..end).map(|k| field.data()[[k, iy, ix]]));
                data[[h, iy, ix]] = rainmax_stats::mean_skip_min(&buf, config.min_samples);
            }
        }
        start = end;
    }
    debug!(
        n_samples = field.n_times(),
        n_hours = hours.len(),
        "resampled to hourly means"
    );

    Ok(RainField::new(hours, field.grid().clone(), data)?.with_attrs(field.attrs().clone()))
}

/// Timestamps of `field` that are not exactly on a clock hour.
pub fn off_hour_times(field: &RainField) -> Vec<chrono::NaiveDateTime> {
    field
        .times()
        .iter()
        .copied()
        .filter(|&t| !is_on_the_hour(t))
        .collect()
}
