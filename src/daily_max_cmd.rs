//! Daily-max command: per-day max, hour of max and total for each day
//! archive, plus one annual summary per year.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use tracing::{debug_span, info, info_span, warn};

use rainmax_calendar::Period;
use rainmax_io::{
    ArchiveConfig, NetcdfWriter, annual_max_name, check_file_count, daily_max_name,
    daily_total_name, find_day_files, read_day_archive, year_dir, year_pattern,
};
use rainmax_resample::{
    HourlyConfig, PeriodAggregate, PeriodRollup, QcFilter, Region, RollupBatch, hourly_means,
};

use crate::archive_day::archive_day;
use crate::cli::DailyMaxArgs;
use crate::config::RainmaxConfig;
use crate::convert;

/// Resolved settings shared by every day of the run.
struct DailyMaxJob {
    qc: QcFilter,
    hourly: HourlyConfig,
    archive: ArchiveConfig,
    region: Option<Region>,
    writer: NetcdfWriter,
    daily_max_dir: PathBuf,
    daily_mean_dir: PathBuf,
    annual_dir: PathBuf,
    resolution: &'static str,
}

/// Run the daily-max extractor over each requested year.
pub fn run(args: DailyMaxArgs) -> Result<()> {
    let _cmd = info_span!("daily_max").entered();
    let config = RainmaxConfig::load(args.config.as_deref())?;

    let resolution = args.resolution.as_str();
    let out_root = args
        .outdir
        .clone()
        .unwrap_or_else(|| config.io.output_root.clone());

    let job = DailyMaxJob {
        qc: convert::build_qc_filter(&config.qc)?,
        hourly: convert::build_hourly_config(&config.hourly)?,
        archive: convert::build_archive_config(&config.archive)?,
        region: config
            .daily_max
            .region
            .as_ref()
            .map(convert::build_region)
            .transpose()?,
        writer: NetcdfWriter::new(convert::build_writer_config(&config.output)?)?,
        daily_max_dir: out_root.join("daily_max"),
        daily_mean_dir: out_root.join("daily_mean"),
        annual_dir: out_root.join(format!("annual_max_{resolution}")),
        resolution,
    };
    for dir in [&job.daily_max_dir, &job.daily_mean_dir, &job.annual_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    }

    for &year in &args.years {
        let dir = year_dir(&config.io.data_root, resolution, year);
        if !dir.is_dir() {
            warn!(year, dir = %dir.display(), "source directory missing, skipping year");
            continue;
        }
        let files = find_day_files(&dir, &year_pattern(year, &config.daily_max.file_pattern))
            .with_context(|| format!("failed to list day archives in {}", dir.display()))?;
        check_file_count(year, &files, config.daily_max.expected_files);
        job.process_year(year, &files)?;
    }

    info!("daily-max complete");
    Ok(())
}

impl DailyMaxJob {
    fn process_year(&self, year: i32, files: &[PathBuf]) -> Result<()> {
        let _year = info_span!("year", year).entered();
        let mut rollup = PeriodRollup::new(Period::Year);
        let mut last_file: Option<&Path> = None;

        for path in files.iter().map(PathBuf::as_path) {
            let Some(day) = self.process_day(path)? else {
                continue;
            };
            if let Some(batch) = rollup.advance(day)? {
                self.write_annual(last_file.unwrap_or(path), batch)?;
            }
            last_file = Some(path);
        }

        if let (Some(batch), Some(path)) = (rollup.finalize()?, last_file) {
            self.write_annual(path, batch)?;
        }
        Ok(())
    }

    /// Read, QC and reduce one archive, writing its per-day files.
    fn process_day(&self, path: &Path) -> Result<Option<PeriodAggregate>> {
        let _file = debug_span!("file", path = %path.display()).entered();
        let mut field = read_day_archive(path, &self.archive)
            .with_context(|| format!("failed to read day archive: {}", path.display()))?;
        info!(n_samples = field.n_times(), "read day archive");

        if let Some(region) = &self.region {
            field = field.select_region(region)?;
        }
        let hourly = hourly_means(&self.qc.apply(&field), &self.hourly)?;
        let Some(day) = archive_day(&hourly)? else {
            return Ok(None);
        };

        let max_path = self.daily_max_dir.join(daily_max_name(path));
        self.writer
            .write_daily_max(&max_path, &day)
            .with_context(|| format!("failed to write {}", max_path.display()))?;
        let total_path = self.daily_mean_dir.join(daily_total_name(path));
        self.writer
            .write_daily_total(&total_path, &day)
            .with_context(|| format!("failed to write {}", total_path.display()))?;
        Ok(Some(day))
    }

    fn write_annual(&self, name_source: &Path, batch: RollupBatch) -> Result<()> {
        let summary = batch.summary();
        let year = summary.start().year();
        let path = self
            .annual_dir
            .join(annual_max_name(name_source, year, self.resolution));
        info!(year, n_days = summary.n_contributing(), path = %path.display(), "writing annual summary");
        self.writer
            .write_summaries(&path, std::slice::from_ref(summary))
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
