//! Streaming rollup of fine-period aggregates into coarser periods.
//!
//! ```text
//!            push (same period)
//!              ┌──────────┐
//!              ▼          │
//!  ┌──────┐  push  ┌──────────────┐  flush / finalize  ┌──────┐
//!  │ Idle │──────▶│ Accumulating │──────────────────▶│ Idle │
//!  └──────┘       └──────────────┘                    └──────┘
//! ```

use chrono::NaiveDateTime;
use rainmax_calendar::Period;
use tracing::debug;

use crate::aggregate::PeriodAggregate;
use crate::error::ResampleError;
use crate::summary::{PeriodSummary, summarise};

#[derive(Debug, Clone, Default)]
enum RollupState {
    #[default]
    Idle,
    Accumulating {
        start: NaiveDateTime,
        aggregates: Vec<PeriodAggregate>,
    },
}

/// Aggregates of one completed period together with their summary.
#[derive(Debug, Clone)]
pub struct RollupBatch {
    aggregates: Vec<PeriodAggregate>,
    summary: PeriodSummary,
}

impl RollupBatch {
    /// The buffered fine-period aggregates, in time order.
    pub fn aggregates(&self) -> &[PeriodAggregate] {
        &self.aggregates
    }

    /// Summary over the whole period.
    pub fn summary(&self) -> &PeriodSummary {
        &self.summary
    }

    /// Split into `(aggregates, summary)`.
    pub fn into_parts(self) -> (Vec<PeriodAggregate>, PeriodSummary) {
        (self.aggregates, self.summary)
    }
}

/// Buffers aggregates until their period ends, then emits a [`RollupBatch`].
///
/// The last period is only emitted by [`finalize`](Self::finalize), so a
/// stream that ends mid-period still produces its partial summary.
#[derive(Debug, Clone)]
pub struct PeriodRollup {
    period: Period,
    state: RollupState,
}

impl PeriodRollup {
    /// Creates an idle rollup for `period`.
    pub fn new(period: Period) -> Self {
        Self {
            period,
            state: RollupState::Idle,
        }
    }

    /// Rollup period.
    pub fn period(&self) -> Period {
        self.period
    }

    /// `true` if nothing is buffered.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, RollupState::Idle)
    }

    /// Number of buffered aggregates.
    pub fn buffered(&self) -> usize {
        match &self.state {
            RollupState::Idle => 0,
            RollupState::Accumulating { aggregates, .. } => aggregates.len(),
        }
    }

    /// Start of the period being accumulated.
    pub fn current_period(&self) -> Option<NaiveDateTime> {
        match &self.state {
            RollupState::Idle => None,
            RollupState::Accumulating { start, .. } => Some(*start),
        }
    }

    /// `true` if an aggregate starting at `t` belongs to a new period.
    pub fn should_flush(&self, t: NaiveDateTime) -> bool {
        self.current_period()
            .is_some_and(|start| self.period.floor(t) != start)
    }

    /// Buffer `aggregate` in the current period.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::PeriodMismatch`] if the aggregate belongs to
    /// a different period than the one being accumulated.
    pub fn push(&mut self, aggregate: PeriodAggregate) -> Result<(), ResampleError> {
        let label = self.period.floor(aggregate.start());
        match &mut self.state {
            RollupState::Idle => {
                self.state = RollupState::Accumulating {
                    start: label,
                    aggregates: vec![aggregate],
                };
            }
            RollupState::Accumulating { start, aggregates } => {
                if label != *start {
                    return Err(ResampleError::PeriodMismatch {
                        expected: *start,
                        got: label,
                    });
                }
                aggregates.push(aggregate);
            }
        }
        Ok(())
    }

    /// Emit the buffered period, if any, and return to idle.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError`] if the buffered aggregates cannot be
    /// summarised.
    pub fn flush(&mut self) -> Result<Option<RollupBatch>, ResampleError> {
        let RollupState::Accumulating { start, aggregates } = std::mem::take(&mut self.state) else {
            return Ok(None);
        };
        let summary = summarise(&aggregates, self.period)?
            .into_iter()
            .next()
            .ok_or(ResampleError::EmptyField)?;
        debug!(
            period = %self.period.label(start),
            n = aggregates.len(),
            "rollup period complete"
        );
        Ok(Some(RollupBatch {
            aggregates,
            summary,
        }))
    }

    /// Push `aggregate`, first flushing the current period if it has ended.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError`] if flushing fails.
    pub fn advance(
        &mut self,
        aggregate: PeriodAggregate,
    ) -> Result<Option<RollupBatch>, ResampleError> {
        let flushed = if self.should_flush(aggregate.start()) {
            self.flush()?
        } else {
            None
        };
        self.push(aggregate)?;
        Ok(flushed)
    }

    /// End of stream: emit whatever is still buffered.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError`] if the buffered aggregates cannot be
    /// summarised.
    pub fn finalize(mut self) -> Result<Option<RollupBatch>, ResampleError> {
        self.flush()
    }
}
