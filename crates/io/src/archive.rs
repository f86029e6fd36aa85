//! Reading one day of sub-hourly composites from a tar of gzipped Nimrod files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::{Axis, stack};
use rainmax_resample::{Attrs, RainField};
use tracing::{debug, warn};

use crate::error::IoError;
use crate::nimrod::{NimrodImage, decode_nimrod};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Attribute naming the archive a field was read from.
pub const SOURCE_ATTR: &str = "source";

/// Configuration for reading day archives.
///
/// `samples_per_day` is the member count a complete day is expected to
/// have: 96 for 15-minute composites, 288 for 5-minute ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    samples_per_day: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            samples_per_day: 96,
        }
    }
}

impl ArchiveConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expected number of samples per day.
    pub fn with_samples_per_day(mut self, n: usize) -> Self {
        self.samples_per_day = n;
        self
    }

    /// Expected number of samples per day.
    pub fn samples_per_day(&self) -> usize {
        self.samples_per_day
    }
}

/// Read a day archive into a [`RainField`] in mm/hr.
///
/// Members may be gzip-compressed or plain Nimrod files and are sorted by
/// validity time. A member count other than
/// [`samples_per_day`](ArchiveConfig::samples_per_day) is logged, not
/// rejected.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if `path` does not exist,
/// [`IoError::Archive`] if the tar is unreadable, a member fails to decode,
/// the archive is empty, or members sit on different grids, and
/// [`IoError::Resample`] if two members share a validity time.
pub fn read_day_archive(path: &Path, config: &ArchiveConfig) -> Result<RainField, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let archive_err = |reason: String| IoError::Archive {
        path: path.to_path_buf(),
        reason,
    };

    let mut tar = tar::Archive::new(BufReader::new(File::open(path)?));
    let mut images: Vec<NimrodImage> = Vec::new();
    for entry in tar.entries().map_err(|e| archive_err(e.to_string()))? {
        let mut entry = entry.map_err(|e| archive_err(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|e| archive_err(format!("{name}: {e}")))?;
        let bytes = if raw.starts_with(&GZIP_MAGIC) {
            let mut out = Vec::new();
            GzDecoder::new(raw.as_slice())
                .read_to_end(&mut out)
                .map_err(|e| archive_err(format!("{name}: {e}")))?;
            out
        } else {
            raw
        };
        let image = decode_nimrod(&bytes).map_err(|e| archive_err(format!("{name}: {e}")))?;
        images.push(image);
    }

    let first = images
        .first()
        .ok_or_else(|| archive_err("no Nimrod members".to_string()))?;
    if let Some(other) = images.iter().find(|img| img.grid() != first.grid()) {
        return Err(archive_err(format!(
            "member at {} has grid {:?}, expected {:?}",
            other.time(),
            other.grid().shape(),
            first.grid().shape()
        )));
    }
    let grid = first.grid().clone();

    images.sort_by_key(NimrodImage::time);
    if images.len() != config.samples_per_day {
        warn!(
            path = %path.display(),
            expected = config.samples_per_day,
            got = images.len(),
            "unexpected number of samples in day archive"
        );
    }
    debug!(path = %path.display(), n = images.len(), "read day archive");

    let times = images.iter().map(NimrodImage::time).collect();
    let views: Vec<_> = images.iter().map(|img| img.values().view()).collect();
    let data = stack(Axis(0), &views).map_err(|e| archive_err(e.to_string()))?;

    let mut attrs = Attrs::new();
    if let Some(name) = path.file_name() {
        attrs.insert(SOURCE_ATTR.to_string(), name.to_string_lossy().into_owned());
    }
    Ok(RainField::new(times, grid, data)?.with_attrs(attrs))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    use super::*;
    use crate::nimrod::test_support::{Spec, encode_i16};

    fn t(minutes: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::minutes(minutes)
    }

    fn spec(time: NaiveDateTime, cols: usize) -> Spec {
        Spec {
            time,
            x0: 500.0,
            dx: 1000.0,
            y0: 2500.0,
            dy: 1000.0,
            rows: 2,
            cols,
            mdi: -1,
            seconds: None,
        }
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    /// Tar of gzipped members `((time, cols), values)`, in the given order.
    fn write_archive(path: &Path, members: &[((NaiveDateTime, usize), Vec<i16>)]) {
        let mut builder = tar::Builder::new(File::create(path).unwrap());
        for (i, ((time, cols), values)) in members.iter().enumerate() {
            let data = gzip(&encode_i16(&spec(*time, *cols), values));
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("member_{i}.dat.gz"), data.as_slice())
                .unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn reads_and_sorts_members() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("radar_uk_20210712_1km-composite.dat.gz.tar");
        write_archive(
            &path,
            &[
                ((t(15), 2), vec![64; 4]),
                ((t(0), 2), vec![32, -1, 32, 32]),
            ],
        );

        let field = read_day_archive(&path, &ArchiveConfig::new()).unwrap();
        assert_eq!(field.times(), &[t(0), t(15)]);
        assert_eq!(field.grid().shape(), (2, 2));
        assert_abs_diff_eq!(field.data()[[0, 0, 0]], 1.0);
        assert!(field.data()[[0, 0, 1]].is_nan());
        assert_abs_diff_eq!(field.data()[[1, 1, 1]], 2.0);
        assert_eq!(
            field.attr(SOURCE_ATTR),
            Some("radar_uk_20210712_1km-composite.dat.gz.tar")
        );
    }

    #[test]
    fn mixed_grids_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("day.dat.gz.tar");
        write_archive(&path, &[((t(0), 2), vec![0; 4]), ((t(15), 3), vec![0; 6])]);
        let err = read_day_archive(&path, &ArchiveConfig::new()).unwrap_err();
        assert!(matches!(err, IoError::Archive { .. }));
    }

    #[test]
    fn duplicate_times_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("day.dat.gz.tar");
        write_archive(&path, &[((t(0), 2), vec![0; 4]), ((t(0), 2), vec![0; 4])]);
        let err = read_day_archive(&path, &ArchiveConfig::new()).unwrap_err();
        assert!(matches!(err, IoError::Resample(_)));
    }

    #[test]
    fn empty_archive_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("day.dat.gz.tar");
        write_archive(&path, &[]);
        let err = read_day_archive(&path, &ArchiveConfig::new()).unwrap_err();
        assert!(matches!(err, IoError::Archive { .. }));
    }

    #[test]
    fn missing_archive() {
        let err = read_day_archive(Path::new("/no/such/day.tar"), &ArchiveConfig::new()).unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn config_builder() {
        let c = ArchiveConfig::new().with_samples_per_day(288);
        assert_eq!(c.samples_per_day(), 288);
        assert_eq!(ArchiveConfig::default().samples_per_day(), 96);
    }
}
