//! Monthly command: buffers daily aggregates of the hourly series and of
//! its two-hour rolling mean, writing daily and monthly files whenever a
//! month completes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug_span, info, info_span, warn};

use rainmax_calendar::Period;
use rainmax_io::{
    ArchiveConfig, NetcdfWriter, find_day_files, month_pattern, period_file_name,
    read_day_archive, year_dir,
};
use rainmax_resample::{
    HourCarry, HourlyConfig, PeriodRollup, QcFilter, RainField, RollupBatch, hourly_means,
};

use crate::archive_day::archive_day;
use crate::cli::MonthlyArgs;
use crate::config::RainmaxConfig;
use crate::convert;

/// File-name suffix of the two-hour rolling-mean outputs.
const TWO_HOUR_EXTRA: &str = "2hr";

/// One month-by-month rollup and the name suffix of its outputs.
struct Series {
    extra: &'static str,
    rollup: PeriodRollup,
}

impl Series {
    fn new(extra: &'static str) -> Self {
        Self {
            extra,
            rollup: PeriodRollup::new(Period::Month),
        }
    }
}

struct MonthlyJob {
    qc: QcFilter,
    hourly: HourlyConfig,
    archive: ArchiveConfig,
    writer: NetcdfWriter,
    outdir: PathBuf,
}

/// Run the monthly aggregator over the requested years as one stream.
pub fn run(args: MonthlyArgs) -> Result<()> {
    let _cmd = info_span!("monthly").entered();
    let config = RainmaxConfig::load(args.config.as_deref())?;

    let resolution = args.resolution.as_str();
    let outdir = args.outdir.clone().unwrap_or_else(|| {
        config
            .io
            .output_root
            .join(format!("summary_{resolution}"))
    });

    if args.test {
        info!(dir = %outdir.display(), "would create");
    } else {
        fs::create_dir_all(&outdir)
            .with_context(|| format!("failed to create output directory: {}", outdir.display()))?;
    }

    let job = MonthlyJob {
        qc: convert::build_qc_filter(&config.qc)?,
        hourly: convert::build_hourly_config(&config.hourly)?,
        archive: convert::build_archive_config(&config.archive)?,
        writer: NetcdfWriter::new(convert::build_writer_config(&config.output)?)?,
        outdir,
    };

    let mut hourly_series = Series::new("");
    let mut two_hour_series = Series::new(TWO_HOUR_EXTRA);
    let mut carry = HourCarry::new();
    let mut last_file: Option<PathBuf> = None;

    for &year in &args.years {
        let _year = info_span!("year", year).entered();
        let dir = year_dir(&config.io.data_root, resolution, year);
        if !dir.is_dir() {
            warn!(year, dir = %dir.display(), "source directory missing, skipping year");
            continue;
        }
        let files = find_day_files(&dir, &month_pattern(year, &args.month_glob))
            .with_context(|| format!("failed to list day archives in {}", dir.display()))?;
        info!(n_files = files.len(), "found day archives");

        for path in files {
            if args.test {
                info!(path = %path.display(), "would read");
                continue;
            }
            let _file = debug_span!("file", path = %path.display()).entered();
            let hourly = job.read_hourly(&path)?;
            let two_hour = carry.roll(&hourly)?;
            carry.remember(&hourly);

            // Batches flushed here belong to files already seen.
            let name_source = last_file.as_deref().unwrap_or(&path);
            job.advance(&mut hourly_series, &hourly, name_source)?;
            job.advance(&mut two_hour_series, &two_hour, name_source)?;
            last_file = Some(path);
        }
    }

    if let Some(name_source) = &last_file {
        for series in [hourly_series, two_hour_series] {
            if let Some(batch) = series.rollup.finalize()? {
                job.write_batch(series.extra, name_source, batch)?;
            }
        }
    }

    info!("monthly complete");
    Ok(())
}

impl MonthlyJob {
    fn read_hourly(&self, path: &Path) -> Result<RainField> {
        let field = read_day_archive(path, &self.archive)
            .with_context(|| format!("failed to read day archive: {}", path.display()))?;
        info!(n_samples = field.n_times(), "read day archive");
        Ok(hourly_means(&self.qc.apply(&field), &self.hourly)?)
    }

    fn advance(&self, series: &mut Series, field: &RainField, name_source: &Path) -> Result<()> {
        let Some(day) = archive_day(field)? else {
            return Ok(());
        };
        if let Some(batch) = series.rollup.advance(day)? {
            self.write_batch(series.extra, name_source, batch)?;
        }
        Ok(())
    }

    /// Write the buffered days and their monthly summary.
    fn write_batch(&self, extra: &str, name_source: &Path, batch: RollupBatch) -> Result<()> {
        let start = batch.summary().start();
        let daily_path = self
            .outdir
            .join(period_file_name(name_source, start, "daily", extra));
        let monthly_path = self
            .outdir
            .join(period_file_name(name_source, start, "monthly", extra));
        info!(
            month = %start.format("%Y-%m"),
            n_days = batch.aggregates().len(),
            daily = %daily_path.display(),
            monthly = %monthly_path.display(),
            "writing month"
        );

        let (aggregates, summary) = batch.into_parts();
        self.writer
            .write_aggregates(&daily_path, &aggregates)
            .with_context(|| format!("failed to write {}", daily_path.display()))?;
        self.writer
            .write_summaries(&monthly_path, &[summary])
            .with_context(|| format!("failed to write {}", monthly_path.display()))?;
        Ok(())
    }
}
