//! # rainmax-io
//!
//! Read one day of UK Nimrod radar composites from its tar archive and
//! write daily, monthly and annual rainfall summaries as compressed
//! NetCDF-4 on the British National Grid. Bridges those formats into the
//! [`RainField`](rainmax_resample::RainField) model.

mod archive;
mod discover;
mod error;
mod naming;
mod netcdf_read;
mod netcdf_write;
mod nimrod;
mod reader;
mod writer;

pub use archive::{ArchiveConfig, SOURCE_ATTR, read_day_archive};
pub use discover::{
    ARCHIVE_SUFFIX, check_file_count, find_day_files, month_pattern, year_dir, year_pattern,
};
pub use error::IoError;
pub use naming::{annual_max_name, daily_max_name, daily_total_name, period_file_name};
pub use nimrod::{NimrodImage, decode_nimrod};
pub use reader::read_summary;
pub use writer::{NetcdfWriter, WriterConfig};
