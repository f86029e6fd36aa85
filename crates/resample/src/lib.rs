//! Hourly resampling and period aggregation of radar rainfall fields.
//!
//! Takes sub-hourly rain-rate composites through quality control, hourly
//! means and per-period maxima, then rolls daily aggregates up into
//! monthly or annual summaries.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────┐   ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//!  │ QcFilter │──▶│ hourly_    │──▶│ aggregate   │──▶│ PeriodRollup │
//!  │ (≤ 400)  │   │ means      │   │ (day)       │   │ (month/year) │
//!  └──────────┘   └────────────┘   └─────────────┘   └──────────────┘
//!                       │
//!                       ▼
//!                 ┌────────────┐
//!                 │ HourCarry  │ two-hour means across files
//!                 └────────────┘
//! ```
//!
//! # Quick start
//!
//! ```ignore
//! use rainmax_calendar::Period;
//! use rainmax_resample::{HourlyConfig, PeriodRollup, QcFilter, aggregate, hourly_means};
//!
//! let qc = QcFilter::default();
//! let mut rollup = PeriodRollup::new(Period::Month);
//! for field in days {
//!     let hourly = hourly_means(&qc.apply(&field), &HourlyConfig::new())?;
//!     for day in aggregate(&hourly, Period::Day)? {
//!         if let Some(batch) = rollup.advance(day)? {
//!             write(batch)?;
//!         }
//!     }
//! }
//! if let Some(batch) = rollup.finalize()? {
//!     write(batch)?;
//! }
//! ```

mod aggregate;
mod composite;
mod error;
mod field;
mod hourly;
mod qc;
mod reduce;
mod rolling;
mod rollup;
mod summary;

pub use aggregate::{HOURS_PER_DAY, PeriodAggregate, aggregate, period_total};
pub use composite::{Composite, composite};
pub use error::ResampleError;
pub use field::{Attrs, Grid, RainField, Region};
pub use hourly::{HourlyConfig, hourly_means, off_hour_times};
pub use qc::{DEFAULT_MAX_RATE, QcFilter};
pub use reduce::{MaxReduction, masked_argmax, reduce_max};
pub use rolling::{HourCarry, MISSING_PREVIOUS_DAY, TWO_HOUR_NOTES_ATTR, two_hour_mean};
pub use rollup::{PeriodRollup, RollupBatch};
pub use summary::{PeriodSummary, summarise};
