//! Decoder for single-image Nimrod radar files.
//!
//! A Nimrod file holds big-endian Fortran unformatted records: a 512-byte
//! header followed by one data record of `rows * cols` values.
//!
//! | Header block | Count | Type |
//! |--------------|-------|------|
//! | general integers | 31 | `i16` |
//! | general reals | 28 | `f32` |
//! | specific reals | 45 | `f32` |
//! | characters | 56 | ASCII |
//! | specific integers | 51 | `i16` |

use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array2;
use nom::IResult;
use nom::bytes::complete::take;
use nom::combinator::{all_consuming, verify};
use nom::multi::{count, length_data};
use nom::number::complete::{be_f32, be_i16, be_i32, be_u32};
use rainmax_resample::Grid;

use crate::error::IoError;

const HEADER_LEN: usize = 512;
const N_GENERAL_INTS: usize = 31;
const N_GENERAL_REALS: usize = 28;
const N_SPECIFIC_REALS: usize = 45;
const N_CHARS: usize = 56;
const N_SPECIFIC_INTS: usize = 51;

#[cfg(test)]
const REALS_OFFSET: usize = N_GENERAL_INTS * 2;
#[cfg(test)]
const CHARS_OFFSET: usize = REALS_OFFSET + (N_GENERAL_REALS + N_SPECIFIC_REALS) * 4;

// General integer slots.
const INT_DATA_TYPE: usize = 11;
const INT_BYTES_PER_DATUM: usize = 12;
const INT_ROWS: usize = 15;
const INT_COLS: usize = 16;
const INT_MDI: usize = 24;

// General real slots.
const REAL_Y_ORIGIN: usize = 2;
const REAL_ROW_STEP: usize = 3;
const REAL_X_ORIGIN: usize = 4;
const REAL_COL_STEP: usize = 5;
const REAL_MDI: usize = 6;

/// Characters holding the units string.
const UNITS_LEN: usize = 8;

/// Sentinel seen in some archives for an unset seconds field.
const UNSET_SECONDS: i16 = -32767;

/// One decoded Nimrod image.
#[derive(Debug, Clone)]
pub struct NimrodImage {
    time: NaiveDateTime,
    grid: Grid,
    units: String,
    values: Array2<f32>,
}

impl NimrodImage {
    /// Validity time.
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// Cell-centre grid; rows run north to south.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Units string from the header, as stored.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Values `[row, col]` in physical units; missing data is NaN.
    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Consume the image, returning its values.
    pub fn into_values(self) -> Array2<f32> {
        self.values
    }
}

/// Header fields used by the decoder.
struct Header<'a> {
    ints: Vec<i16>,
    reals: Vec<f32>,
    chars: &'a [u8],
}

/// One big-endian Fortran unformatted record: length, payload, length.
fn record(i: &[u8]) -> IResult<&[u8], &[u8]> {
    let (i, payload) = length_data(be_u32)(i)?;
    let len = payload.len();
    let (i, _) = verify(be_u32, |&trailer: &u32| trailer as usize == len)(i)?;
    Ok((i, payload))
}

fn header(i: &[u8]) -> IResult<&[u8], Header<'_>> {
    let (i, ints) = count(be_i16, N_GENERAL_INTS)(i)?;
    let (i, reals) = count(be_f32, N_GENERAL_REALS)(i)?;
    let (i, _) = count(be_f32, N_SPECIFIC_REALS)(i)?;
    let (i, chars) = take(N_CHARS)(i)?;
    let (i, _) = count(be_i16, N_SPECIFIC_INTS)(i)?;
    Ok((i, Header { ints, reals, chars }))
}

/// Run `parser` over the whole of `input`, naming `what` in any error.
fn parse_all<'a, O>(
    what: &str,
    input: &'a [u8],
    parser: impl FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
) -> Result<O, IoError> {
    all_consuming(parser)(input)
        .map(|(_, out)| out)
        .map_err(|e| nom_err(what, input, e))
}

fn nom_err(what: &str, input: &[u8], e: nom::Err<nom::error::Error<&[u8]>>) -> IoError {
    let reason = match e {
        nom::Err::Incomplete(_) => format!("{what}: truncated"),
        nom::Err::Error(e) | nom::Err::Failure(e) => format!(
            "{what}: {:?} at byte {}",
            e.code,
            input.len() - e.input.len()
        ),
    };
    decode_err(reason)
}

/// Decode a Nimrod file held in memory.
///
/// # Errors
///
/// Returns [`IoError::Decode`] if a record is truncated, the record
/// markers disagree, the validity time is invalid, or the data type is
/// not supported.
pub fn decode_nimrod(bytes: &[u8]) -> Result<NimrodImage, IoError> {
    let (header_bytes, data) = parse_all("record framing", bytes, |i| {
        let (i, header) = record(i)?;
        let (i, data) = record(i)?;
        Ok((i, (header, data)))
    })?;
    if header_bytes.len() != HEADER_LEN {
        return Err(decode_err(format!(
            "header record is {} bytes, expected {HEADER_LEN}",
            header_bytes.len()
        )));
    }
    let hdr = parse_all("header", header_bytes, header)?;
    let int = |i: usize| hdr.ints[i];
    let real = |i: usize| hdr.reals[i];

    let time = validity_time(&hdr.ints)?;
    let nrows = dim(int(INT_ROWS), "rows")?;
    let ncols = dim(int(INT_COLS), "cols")?;
    let units = String::from_utf8_lossy(&hdr.chars[..UNITS_LEN])
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string();
    let scale = units_scale(&units);

    let grid = Grid::regular(
        f64::from(real(REAL_X_ORIGIN)),
        f64::from(real(REAL_COL_STEP)),
        ncols,
        f64::from(real(REAL_Y_ORIGIN)),
        f64::from(real(REAL_ROW_STEP)),
        nrows,
    );

    let n = nrows * ncols;
    let raw: Vec<f32> = match (int(INT_DATA_TYPE), int(INT_BYTES_PER_DATUM)) {
        (0, 4) => {
            let mdi = real(REAL_MDI);
            check_data_len(data, n, 4)?;
            parse_all("data", data, count(be_f32, n))?
                .into_iter()
                .map(|v| if v == mdi { f32::NAN } else { v * scale })
                .collect()
        }
        (1, 2) => {
            let mdi = int(INT_MDI);
            check_data_len(data, n, 2)?;
            parse_all("data", data, count(be_i16, n))?
                .into_iter()
                .map(|v| if v == mdi { f32::NAN } else { f32::from(v) * scale })
                .collect()
        }
        (1, 4) => {
            let mdi = i32::from(int(INT_MDI));
            check_data_len(data, n, 4)?;
            parse_all("data", data, count(be_i32, n))?
                .into_iter()
                .map(|v| if v == mdi { f32::NAN } else { v as f32 * scale })
                .collect()
        }
        (t, b) => {
            return Err(decode_err(format!(
                "unsupported data type {t} with {b} bytes per datum"
            )));
        }
    };
    let values = Array2::from_shape_vec((nrows, ncols), raw)
        .map_err(|e| decode_err(e.to_string()))?;

    Ok(NimrodImage {
        time,
        grid,
        units,
        values,
    })
}

/// Multiplier that converts stored values to physical units.
///
/// `mm/h*32` means values were stored multiplied by 32.
fn units_scale(units: &str) -> f32 {
    units
        .split_once('*')
        .and_then(|(_, factor)| factor.trim().parse::<f32>().ok())
        .filter(|f| *f != 0.0)
        .map_or(1.0, |f| 1.0 / f)
}

fn validity_time(ints: &[i16]) -> Result<NaiveDateTime, IoError> {
    let second = match ints[5] {
        UNSET_SECONDS => 0,
        s => s,
    };
    let parts = [ints[0], ints[1], ints[2], ints[3], ints[4], second];
    NaiveDate::from_ymd_opt(i32::from(parts[0]), parts[1] as u32, parts[2] as u32)
        .and_then(|d| d.and_hms_opt(parts[3] as u32, parts[4] as u32, parts[5] as u32))
        .ok_or_else(|| decode_err(format!("invalid validity time {parts:?}")))
}

fn dim(v: i16, name: &str) -> Result<usize, IoError> {
    usize::try_from(v)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| decode_err(format!("invalid number of {name}: {v}")))
}

fn check_data_len(data: &[u8], n: usize, width: usize) -> Result<(), IoError> {
    if data.len() == n * width {
        return Ok(());
    }
    Err(decode_err(format!(
        "data record is {} bytes, expected {}",
        data.len(),
        n * width
    )))
}

fn decode_err(reason: String) -> IoError {
    IoError::Decode { reason }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builds Nimrod files for tests.

    use chrono::{Datelike, NaiveDateTime, Timelike};

    use super::*;

    pub(crate) struct Spec {
        pub time: NaiveDateTime,
        pub x0: f32,
        pub dx: f32,
        pub y0: f32,
        pub dy: f32,
        pub rows: usize,
        pub cols: usize,
        pub mdi: i16,
        pub seconds: Option<i16>,
    }

    fn record(out: &mut Vec<u8>, payload: &[u8]) {
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    }

    /// Encode `values` (already multiplied by 32) as `i16` `mm/h*32`.
    pub(crate) fn encode_i16(spec: &Spec, values: &[i16]) -> Vec<u8> {
        let mut header = vec![0_u8; HEADER_LEN];
        let mut put_int = |i: usize, v: i16| header[2 * i..2 * i + 2].copy_from_slice(&v.to_be_bytes());
        let t = spec.time;
        put_int(0, t.year() as i16);
        put_int(1, t.month() as i16);
        put_int(2, t.day() as i16);
        put_int(3, t.hour() as i16);
        put_int(4, t.minute() as i16);
        put_int(5, spec.seconds.unwrap_or(t.second() as i16));
        put_int(INT_DATA_TYPE, 1);
        put_int(INT_BYTES_PER_DATUM, 2);
        put_int(INT_ROWS, spec.rows as i16);
        put_int(INT_COLS, spec.cols as i16);
        put_int(INT_MDI, spec.mdi);
        let mut put_real = |i: usize, v: f32| {
            let o = REALS_OFFSET + 4 * i;
            header[o..o + 4].copy_from_slice(&v.to_be_bytes());
        };
        put_real(REAL_Y_ORIGIN, spec.y0);
        put_real(REAL_ROW_STEP, spec.dy);
        put_real(REAL_X_ORIGIN, spec.x0);
        put_real(REAL_COL_STEP, spec.dx);
        put_real(REAL_MDI, -1.0);
        header[CHARS_OFFSET..CHARS_OFFSET + 8].copy_from_slice(b"mm/h*32 ");

        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        let mut out = Vec::new();
        record(&mut out, &header);
        record(&mut out, &data);
        out
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use super::test_support::{Spec, encode_i16};
    use super::*;

    fn spec() -> Spec {
        Spec {
            time: NaiveDate::from_ymd_opt(2021, 7, 12)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap(),
            x0: -404_500.0,
            dx: 5000.0,
            y0: 1_549_500.0,
            dy: 5000.0,
            rows: 2,
            cols: 3,
            mdi: -1,
            seconds: None,
        }
    }

    #[test]
    fn decodes_header_and_values() {
        let bytes = encode_i16(&spec(), &[0, 32, 64, -1, 320, 16]);
        let img = decode_nimrod(&bytes).unwrap();
        assert_eq!(img.time(), spec().time);
        assert_eq!(img.units(), "mm/h*32");
        assert_eq!(img.grid().shape(), (2, 3));
        assert_abs_diff_eq!(img.grid().x()[1], -399_500.0);
        assert_abs_diff_eq!(img.grid().y()[1], 1_544_500.0);
        assert_abs_diff_eq!(img.values()[[0, 1]], 1.0);
        assert_abs_diff_eq!(img.values()[[1, 1]], 10.0);
        assert_abs_diff_eq!(img.values()[[1, 2]], 0.5);
        assert!(img.values()[[1, 0]].is_nan());
    }

    #[test]
    fn unset_seconds_read_as_zero() {
        let mut s = spec();
        s.seconds = Some(UNSET_SECONDS);
        let img = decode_nimrod(&encode_i16(&s, &[0; 6])).unwrap();
        assert_eq!(img.time(), spec().time);
    }

    #[test]
    fn truncated_file_is_error() {
        let bytes = encode_i16(&spec(), &[0; 6]);
        let err = decode_nimrod(&bytes[..bytes.len() - 6]).unwrap_err();
        assert!(matches!(err, IoError::Decode { .. }));
    }

    #[test]
    fn wrong_value_count_is_error() {
        let bytes = encode_i16(&spec(), &[0; 5]);
        assert!(matches!(
            decode_nimrod(&bytes),
            Err(IoError::Decode { .. })
        ));
    }

    #[test]
    fn record_framing() {
        let mut bytes = vec![0, 0, 0, 3, 7, 8, 9, 0, 0, 0, 3];
        bytes.extend_from_slice(&[0xAA]);
        let (rest, payload) = record(&bytes).unwrap();
        assert_eq!(payload, [7, 8, 9]);
        assert_eq!(rest, [0xAA]);
    }

    #[test]
    fn disagreeing_record_markers_are_error() {
        let mut bytes = encode_i16(&spec(), &[0; 6]);
        // Trailer of the header record.
        bytes[4 + HEADER_LEN + 3] ^= 1;
        let err = decode_nimrod(&bytes).unwrap_err();
        assert!(matches!(err, IoError::Decode { .. }));
    }

    #[test]
    fn trailing_bytes_are_error() {
        let mut bytes = encode_i16(&spec(), &[0; 6]);
        bytes.extend_from_slice(&[0, 0]);
        let err = decode_nimrod(&bytes).unwrap_err();
        assert!(format!("{err}").contains("record framing"));
    }

    #[test]
    fn units_scale_parsing() {
        assert_abs_diff_eq!(units_scale("mm/h*32"), 1.0 / 32.0);
        assert_abs_diff_eq!(units_scale("mm/h"), 1.0);
        assert_abs_diff_eq!(units_scale("mm/h*0"), 1.0);
    }
}
