//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Result, bail};

use crate::config::*;

use rainmax_io::{ArchiveConfig, WriterConfig};
use rainmax_resample::{HourlyConfig, QcFilter, Region};

/// Builds the QC filter from `[qc]`.
pub fn build_qc_filter(t: &QcToml) -> Result<QcFilter> {
    Ok(QcFilter::new(t.max_rate)?)
}

/// Builds an `HourlyConfig` from `[hourly]`.
pub fn build_hourly_config(t: &HourlyToml) -> Result<HourlyConfig> {
    let config = HourlyConfig::new().with_min_samples(t.min_samples);
    config.validate()?;
    Ok(config)
}

/// Builds an `ArchiveConfig` from `[archive]`.
pub fn build_archive_config(t: &ArchiveToml) -> Result<ArchiveConfig> {
    if t.samples_per_day == 0 {
        bail!("archive.samples_per_day must be positive");
    }
    Ok(ArchiveConfig::new().with_samples_per_day(t.samples_per_day))
}

/// Builds a `WriterConfig` from `[output]`.
pub fn build_writer_config(t: &OutputToml) -> Result<WriterConfig> {
    let config = WriterConfig::default()
        .with_compression_level(t.compression_level)
        .with_shuffle(t.shuffle);
    config.validate()?;
    Ok(config)
}

/// Converts `[daily_max].region` into a `Region`, checking its edges.
pub fn build_region(t: &RegionToml) -> Result<Region> {
    if t.x_min >= t.x_max {
        bail!("region x_min ({}) must be below x_max ({})", t.x_min, t.x_max);
    }
    if t.y_min >= t.y_max {
        bail!("region y_min ({}) must be below y_max ({})", t.y_min, t.y_max);
    }
    Ok(Region {
        x_min: t.x_min,
        x_max: t.x_max,
        y_min: t.y_min,
        y_max: t.y_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_convert() {
        let config = RainmaxConfig::default();
        assert_eq!(build_qc_filter(&config.qc).unwrap().max_rate(), 400.0);
        assert_eq!(build_hourly_config(&config.hourly).unwrap().min_samples(), 1);
        assert_eq!(
            build_archive_config(&config.archive).unwrap().samples_per_day(),
            96
        );
        let writer = build_writer_config(&config.output).unwrap();
        assert_eq!(writer.compression_level(), 4);
        assert!(writer.shuffle());
    }

    #[test]
    fn bad_qc_threshold_rejected() {
        assert!(build_qc_filter(&QcToml { max_rate: -1.0 }).is_err());
    }

    #[test]
    fn zero_min_samples_rejected() {
        assert!(build_hourly_config(&HourlyToml { min_samples: 0 }).is_err());
    }

    #[test]
    fn zero_samples_per_day_rejected() {
        assert!(build_archive_config(&ArchiveToml { samples_per_day: 0 }).is_err());
    }

    #[test]
    fn compression_level_bounded() {
        let t = OutputToml {
            compression_level: 10,
            shuffle: true,
        };
        assert!(build_writer_config(&t).is_err());
    }

    #[test]
    fn region_edges_checked() {
        let good = RegionToml {
            x_min: 0.0,
            x_max: 10_000.0,
            y_min: 500.0,
            y_max: 20_000.0,
        };
        let region = build_region(&good).unwrap();
        assert_eq!(region.y_max, 20_000.0);

        let flipped = RegionToml {
            x_min: 10_000.0,
            x_max: 0.0,
            ..good
        };
        let err = build_region(&flipped).unwrap_err();
        assert!(err.to_string().contains("x_min"));
    }
}
