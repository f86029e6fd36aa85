use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "rainmax.toml";

/// Top-level rainmax configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RainmaxConfig {
    /// Input and output locations.
    #[serde(default)]
    pub io: IoToml,

    /// Quality-control settings.
    #[serde(default)]
    pub qc: QcToml,

    /// Hourly-mean settings.
    #[serde(default)]
    pub hourly: HourlyToml,

    /// Day-archive settings.
    #[serde(default)]
    pub archive: ArchiveToml,

    /// Daily-max extractor settings.
    #[serde(default)]
    pub daily_max: DailyMaxToml,

    /// NetCDF output settings.
    #[serde(default)]
    pub output: OutputToml,
}

impl RainmaxConfig {
    /// Load configuration from `path`, or from `rainmax.toml` in the working
    /// directory if present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&toml_str)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            output_root: default_output_root(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("/badc/ukmo-nimrod/data/composite")
}
fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QcToml {
    /// Rain rates above this (mm/hr) are treated as missing.
    #[serde(default = "default_max_rate")]
    pub max_rate: f32,
}

impl Default for QcToml {
    fn default() -> Self {
        Self {
            max_rate: default_max_rate(),
        }
    }
}

fn default_max_rate() -> f32 {
    rainmax_resample::DEFAULT_MAX_RATE
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HourlyToml {
    /// Present samples needed for an hourly mean to count.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for HourlyToml {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
        }
    }
}

fn default_min_samples() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveToml {
    #[serde(default = "default_samples_per_day")]
    pub samples_per_day: usize,
}

impl Default for ArchiveToml {
    fn default() -> Self {
        Self {
            samples_per_day: default_samples_per_day(),
        }
    }
}

fn default_samples_per_day() -> usize {
    96
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyMaxToml {
    /// Glob for day archives within a year directory, after the year.
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    /// Day archives expected per year.
    #[serde(default = "default_expected_files")]
    pub expected_files: usize,
    /// Optional projected-coordinate box to cut before QC.
    #[serde(default)]
    pub region: Option<RegionToml>,
}

impl Default for DailyMaxToml {
    fn default() -> Self {
        Self {
            file_pattern: default_file_pattern(),
            expected_files: default_expected_files(),
            region: None,
        }
    }
}

fn default_file_pattern() -> String {
    "[0-9][0-9][0-9][0-9]_*.dat.gz.tar".to_string()
}
fn default_expected_files() -> usize {
    365
}

/// Box in British National Grid metres.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct RegionToml {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    /// Deflate level, 0-9.
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
    #[serde(default = "default_true")]
    pub shuffle: bool,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            shuffle: default_true(),
        }
    }
}

fn default_compression_level() -> u8 {
    4
}
fn default_true() -> bool {
    true
}
