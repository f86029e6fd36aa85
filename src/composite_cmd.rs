//! Composite command: median, maximum and year of maximum across annual
//! summary files.

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};

use rainmax_calendar::Period;
use rainmax_io::{NetcdfWriter, find_day_files, read_summary};
use rainmax_resample::composite;

use crate::cli::CompositeArgs;
use crate::config::RainmaxConfig;
use crate::convert;

/// Build the composite of every annual file for the chosen resolution.
pub fn run(args: CompositeArgs) -> Result<()> {
    let _cmd = info_span!("composite").entered();
    let config = RainmaxConfig::load(args.config.as_deref())?;

    let resolution = args.resolution.as_str();
    let input = args.input.clone().unwrap_or_else(|| {
        config
            .io
            .output_root
            .join(format!("annual_max_{resolution}"))
    });
    let output = args.output.clone().unwrap_or_else(|| {
        config
            .io
            .output_root
            .join(format!("composite_{resolution}.nc"))
    });

    let files = find_day_files(&input, &format!("*_{resolution}_max.nc"))
        .with_context(|| format!("failed to list annual files in {}", input.display()))?;
    if files.is_empty() {
        bail!("no annual summary files in {}", input.display());
    }

    let mut summaries = Vec::with_capacity(files.len());
    for path in &files {
        let annual = read_summary(path, Period::Year)
            .with_context(|| format!("failed to read annual summary: {}", path.display()))?;
        debug!(path = %path.display(), n = annual.len(), "read annual summary");
        summaries.extend(annual);
    }
    summaries.sort_by_key(|s| s.start());
    info!(n_years = summaries.len(), "loaded annual summaries");

    let composite = composite(&summaries)?;
    let writer = NetcdfWriter::new(convert::build_writer_config(&config.output)?)?;
    writer
        .write_composite(&output, &composite)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), "composite written");
    Ok(())
}
