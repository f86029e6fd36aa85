//! Quality control of radar rainfall rates.

use tracing::debug;

use crate::error::ResampleError;
use crate::field::RainField;

/// Highest credible rainfall rate in mm/hr.
///
/// Radar composites occasionally carry values near 1024 mm/hr, an encoding
/// artefact. 400 mm/hr is 100 mm in 15 minutes, well above any UK
/// observation.
pub const DEFAULT_MAX_RATE: f32 = 400.0;

/// Rejects implausible rainfall rates by marking them missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcFilter {
    max_rate: f32,
}

impl Default for QcFilter {
    fn default() -> Self {
        Self {
            max_rate: DEFAULT_MAX_RATE,
        }
    }
}

impl QcFilter {
    /// Create a filter with a custom threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidConfig`] unless `max_rate` is finite
    /// and positive.
    pub fn new(max_rate: f32) -> Result<Self, ResampleError> {
        if !max_rate.is_finite() || max_rate <= 0.0 {
            return Err(ResampleError::InvalidConfig {
                reason: format!("QC max_rate must be finite and positive, got {max_rate}"),
            });
        }
        Ok(Self { max_rate })
    }

    /// Threshold above which values are rejected.
    pub fn max_rate(&self) -> f32 {
        self.max_rate
    }

    /// Quality-control a single value. Values equal to the threshold are kept.
    pub fn check(&self, v: f32) -> f32 {
        if v > self.max_rate { f32::NAN } else { v }
    }

    /// Return a copy of `field` with every value above the threshold set
    /// missing. Times, grid and attributes are unchanged.
    pub fn apply(&self, field: &RainField) -> RainField {
        let rejected = field.data().iter().filter(|&&v| v > self.max_rate).count();
        if rejected > 0 {
            debug!(
                rejected,
                max_rate = self.max_rate,
                first = %field.first_time(),
                "QC rejected rainfall rates"
            );
        }
        field.map_values(|v| self.check(v))
    }
}
