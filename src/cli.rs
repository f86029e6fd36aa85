use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Maximum hourly rainfall from UK Nimrod radar composites.
#[derive(Parser)]
#[command(
    name = "rainmax",
    version,
    about = "Daily and monthly maximum hourly rainfall from UK Nimrod radar composites"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Per-day max, hour of max and total, plus annual summaries.
    DailyMax(DailyMaxArgs),
    /// Daily buffers and monthly summaries, hourly and two-hour means.
    Monthly(MonthlyArgs),
    /// Median, max and year of max across annual summary files.
    Composite(CompositeArgs),
}

/// Grid resolution of the radar composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resolution {
    /// 1 km grid.
    #[value(name = "1km")]
    OneKm,
    /// 5 km grid.
    #[value(name = "5km")]
    FiveKm,
}

impl Resolution {
    /// Name used in directory and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneKm => "1km",
            Self::FiveKm => "5km",
        }
    }
}

/// Arguments for the `daily-max` subcommand.
#[derive(clap::Args)]
pub struct DailyMaxArgs {
    /// Years to process.
    #[arg(required = true, num_args = 1..)]
    pub years: Vec<i32>,

    /// Path to TOML configuration file (default: rainmax.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Resolution wanted.
    #[arg(short, long, value_enum, default_value = "1km")]
    pub resolution: Resolution,

    /// Output root; overrides [io].output_root.
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
}

/// Arguments for the `monthly` subcommand.
#[derive(clap::Args)]
pub struct MonthlyArgs {
    /// Years to process.
    #[arg(required = true, num_args = 1..)]
    pub years: Vec<i32>,

    /// Path to TOML configuration file (default: rainmax.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Resolution wanted.
    #[arg(short, long, value_enum, default_value = "5km")]
    pub resolution: Resolution,

    /// Glob pattern matching the month part of file names, e.g. 0[6-8].
    #[arg(long = "glob", default_value = "[0-1][0-9]")]
    pub month_glob: String,

    /// Dry run: log what would be read and written, touch nothing.
    #[arg(short, long)]
    pub test: bool,

    /// Output directory (default: <output_root>/summary_<resolution>).
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
}

/// Arguments for the `composite` subcommand.
#[derive(clap::Args)]
pub struct CompositeArgs {
    /// Path to TOML configuration file (default: rainmax.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Resolution of the annual files.
    #[arg(short, long, value_enum, default_value = "1km")]
    pub resolution: Resolution,

    /// Directory of annual summary files
    /// (default: <output_root>/annual_max_<resolution>).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output NetCDF path (default: <output_root>/composite_<resolution>.nc).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
