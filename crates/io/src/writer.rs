//! High-level NetCDF writer configuration and orchestration.

use std::path::Path;

use rainmax_calendar::hours_since_epoch;
use rainmax_resample::{
    Attrs, Composite, PeriodAggregate, PeriodSummary, ResampleError,
};
use tracing::info;

use crate::error::IoError;
use crate::netcdf_write::{
    Deflate, MAX_TIME_ATTR, create_file, put_count_series, put_field, put_global_attrs,
    put_grid, put_map, put_time_axis, put_time_field, put_time_series, put_year_map,
};

/// Configuration for NetCDF output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Deflate level, 0 (none) to 9.
    compression_level: u8,
    /// Whether to apply the shuffle filter before deflating.
    shuffle: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression_level: 4,
            shuffle: true,
        }
    }
}

impl WriterConfig {
    /// Sets the deflate level.
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Enables or disables the shuffle filter.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Deflate level.
    pub fn compression_level(&self) -> u8 {
        self.compression_level
    }

    /// Whether shuffle is enabled.
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Netcdf`] if the compression level exceeds 9.
    pub fn validate(&self) -> Result<(), IoError> {
        if self.compression_level > 9 {
            return Err(IoError::Netcdf {
                reason: format!(
                    "compression_level must be 0..=9, got {}",
                    self.compression_level
                ),
            });
        }
        Ok(())
    }

    fn deflate(&self) -> Deflate {
        Deflate {
            level: i32::from(self.compression_level),
            shuffle: self.shuffle,
        }
    }
}

/// Writes aggregates, summaries and composites as compressed NetCDF-4 files
/// on the British National Grid.
#[derive(Debug, Clone)]
pub struct NetcdfWriter {
    config: WriterConfig,
}

impl NetcdfWriter {
    /// Create a writer after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Netcdf`] if the configuration is invalid.
    pub fn new(config: WriterConfig) -> Result<Self, IoError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Write one day's max (`dailyMaxRain`, mm/hr) and hour of max
    /// (`dailyMaxHr`).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Netcdf`] on any library failure.
    pub fn write_daily_max(&self, path: &Path, day: &PeriodAggregate) -> Result<(), IoError> {
        let mut file = create_file(path)?;
        put_global_attrs(&mut file, day.attrs())?;
        put_grid(&mut file, day.grid())?;
        put_time_axis(&mut file, &[day.start()])?;
        put_field(&mut file, "dailyMaxRain", "mm/hr", &[day.max()], self.config.deflate())?;
        put_field(&mut file, "dailyMaxHr", "hour", &[&day.max_hour()], self.config.deflate())?;
        info!(path = %path.display(), "wrote daily max");
        Ok(())
    }

    /// Write one day's total (`dailyMeanRain`, mm/day).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Netcdf`] on any library failure.
    pub fn write_daily_total(&self, path: &Path, day: &PeriodAggregate) -> Result<(), IoError> {
        let mut file = create_file(path)?;
        put_global_attrs(&mut file, day.attrs())?;
        put_grid(&mut file, day.grid())?;
        put_time_axis(&mut file, &[day.start()])?;
        put_field(&mut file, "dailyMeanRain", "mm/day", &[day.total()], self.config.deflate())?;
        info!(path = %path.display(), "wrote daily total");
        Ok(())
    }

    /// Write a run of aggregates along time as `<p>Max`, `<p>MaxTime` and
    /// `<p>Total`, where `<p>` names the aggregation period.
    ///
    /// Attributes shared by every aggregate become global attributes.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Resample`] for an empty slice or
    /// [`IoError::Netcdf`] on any library failure.
    pub fn write_aggregates(&self, path: &Path, aggs: &[PeriodAggregate]) -> Result<(), IoError> {
        let first = aggs.first().ok_or(ResampleError::EmptyField)?;
        let p = first.period().name();
        let times: Vec<_> = aggs.iter().map(PeriodAggregate::start).collect();

        let mut file = create_file(path)?;
        put_global_attrs(&mut file, &shared_attrs(aggs.iter().map(PeriodAggregate::attrs)))?;
        put_grid(&mut file, first.grid())?;
        put_time_axis(&mut file, &times)?;
        let maxes: Vec<_> = aggs.iter().map(PeriodAggregate::max).collect();
        let max_times: Vec<_> = aggs.iter().map(PeriodAggregate::max_time).collect();
        let totals: Vec<_> = aggs.iter().map(PeriodAggregate::total).collect();
        put_field(&mut file, &format!("{p}Max"), "mm/hr", &maxes, self.config.deflate())?;
        put_time_field(&mut file, &format!("{p}MaxTime"), &max_times, self.config.deflate())?;
        put_field(&mut file, &format!("{p}Total"), "mm/day", &totals, self.config.deflate())?;
        info!(path = %path.display(), n = aggs.len(), "wrote {p} aggregates");
        Ok(())
    }

    /// Write summaries along time as `<p>Max`, `<p>MaxTime`, `<p>Mean`,
    /// `<p>Count` and `<p>Latest`, plus a global `max_time` attribute
    /// holding the latest contributing time.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Resample`] for an empty slice or
    /// [`IoError::Netcdf`] on any library failure.
    pub fn write_summaries(&self, path: &Path, summaries: &[PeriodSummary]) -> Result<(), IoError> {
        let first = summaries.first().ok_or(ResampleError::EmptyField)?;
        let p = first.period().name();
        let times: Vec<_> = summaries.iter().map(PeriodSummary::start).collect();
        let latest: Vec<_> = summaries.iter().map(PeriodSummary::latest).collect();
        let counts: Vec<i32> = summaries
            .iter()
            .map(|s| i32::try_from(s.n_contributing()).unwrap_or(i32::MAX))
            .collect();

        let mut file = create_file(path)?;
        if let Some(max_time) = latest.iter().max() {
            file.add_attribute(MAX_TIME_ATTR, hours_since_epoch(*max_time))?;
        }
        put_grid(&mut file, first.grid())?;
        put_time_axis(&mut file, &times)?;
        let maxes: Vec<_> = summaries.iter().map(PeriodSummary::max).collect();
        let max_times: Vec<_> = summaries.iter().map(PeriodSummary::max_time).collect();
        let means: Vec<_> = summaries.iter().map(PeriodSummary::mean).collect();
        put_field(&mut file, &format!("{p}Max"), "mm/hr", &maxes, self.config.deflate())?;
        put_time_field(&mut file, &format!("{p}MaxTime"), &max_times, self.config.deflate())?;
        put_field(&mut file, &format!("{p}Mean"), "mm/day", &means, self.config.deflate())?;
        put_count_series(&mut file, &format!("{p}Count"), &counts)?;
        put_time_series(&mut file, &format!("{p}Latest"), &latest)?;
        info!(path = %path.display(), n = summaries.len(), "wrote {p} summaries");
        Ok(())
    }

    /// Write a multi-year composite (`medianMax`, `maxMax`, `yearOfMax`).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Netcdf`] on any library failure.
    pub fn write_composite(&self, path: &Path, composite: &Composite) -> Result<(), IoError> {
        let mut file = create_file(path)?;
        file.add_attribute("n_periods", i32::try_from(composite.n_periods()).unwrap_or(i32::MAX))?;
        put_grid(&mut file, composite.grid())?;
        put_map(&mut file, "medianMax", "mm/hr", composite.median(), self.config.deflate())?;
        put_map(&mut file, "maxMax", "mm/hr", composite.max(), self.config.deflate())?;
        put_year_map(&mut file, "yearOfMax", composite.year_of_max(), self.config.deflate())?;
        info!(path = %path.display(), "wrote composite");
        Ok(())
    }
}

/// Attributes present with the same value on every input.
fn shared_attrs<'a>(mut all: impl Iterator<Item = &'a Attrs>) -> Attrs {
    let Some(first) = all.next() else {
        return Attrs::new();
    };
    let mut shared = first.clone();
    for attrs in all {
        shared.retain(|k, v| attrs.get(k) == Some(&*v));
    }
    shared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WriterConfig::default();
        assert_eq!(config.compression_level(), 4);
        assert!(config.shuffle());
    }

    #[test]
    fn builder_methods() {
        let config = WriterConfig::default()
            .with_compression_level(9)
            .with_shuffle(false);
        assert_eq!(config.compression_level(), 9);
        assert!(!config.shuffle());
    }

    #[test]
    fn validate_rejects_level_above_nine() {
        let err = NetcdfWriter::new(WriterConfig::default().with_compression_level(10)).unwrap_err();
        assert!(err.to_string().contains("compression_level"));
    }

    #[test]
    fn shared_attrs_drops_conflicts() {
        let a = Attrs::from([("source".into(), "a".into()), ("kind".into(), "x".into())]);
        let b = Attrs::from([("source".into(), "b".into()), ("kind".into(), "x".into())]);
        let shared = shared_attrs([&a, &b].into_iter());
        assert_eq!(shared.len(), 1);
        assert_eq!(shared.get("kind").map(String::as_str), Some("x"));
    }
}
