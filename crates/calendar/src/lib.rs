//! # rainmax-calendar
//!
//! Timestamp arithmetic for resampling sub-hourly radar rainfall into
//! hourly, daily, monthly and annual periods.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["NaiveDateTime"] -->|"Period::floor()"| B["period start"]
//!     B -->|"Period::next()"| B
//!     B -->|"period_sequence()"| C["Vec of period starts"]
//!     A -->|"hours_since_epoch()"| D["f64 hours"]
//!     D -->|"from_hours_since_epoch()"| A
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use rainmax_calendar::{Period, period_sequence, is_on_the_hour};
//!
//! let t = NaiveDate::from_ymd_opt(2021, 7, 12).unwrap().and_hms_opt(10, 45, 0).unwrap();
//! let hour = Period::Hour.floor(t); // 2021-07-12T10:00
//! let month = Period::Month.floor(t); // 2021-07-01T00:00
//! assert!(is_on_the_hour(hour));
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `period` | Resampling periods, flooring and stepping |
//! | `sequence` | Contiguous period-start sequences |
//! | `epoch` | CF-style "hours since 1970" encoding |
//! | `error` | Error types |

mod epoch;
mod error;
mod period;
mod sequence;

pub use epoch::{TIME_UNITS, from_hours_since_epoch, hours_since_epoch};
pub use error::CalendarError;
pub use period::{Period, is_on_the_hour};
pub use sequence::period_sequence;
