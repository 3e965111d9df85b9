// =============================================================================
// Shared types used across the Tessa analysis backend
// =============================================================================
//
// `PriceSeries` is the only entry gate into the indicator pipeline: it can
// only be built through `PriceSeries::new`, which rejects malformed input up
// front. Everything downstream (indicators, frame, API) may therefore assume
// a non-empty, strictly date-ordered series of positive closes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily OHLCV bar for the tracked symbol.
///
/// Dates are trading days only — weekends and market holidays are simply
/// absent from the series, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Validation failures for raw bar data.
///
/// These are the fail-fast cases: feeding the pipeline a series that trips
/// any of them would silently produce misleading indicator values, so the
/// constructor refuses instead.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,

    #[error("dates are not strictly increasing at index {index}: {prev} then {next}")]
    NonMonotonicDates {
        index: usize,
        prev: NaiveDate,
        next: NaiveDate,
    },

    #[error("invalid closing price {close} at index {index} ({date})")]
    InvalidClose {
        index: usize,
        date: NaiveDate,
        close: f64,
    },
}

/// A validated, immutable daily price series for a single symbol.
///
/// Invariants enforced at construction:
/// - at least one bar;
/// - dates strictly increasing (which also rules out duplicates);
/// - every closing price finite and > 0.
///
/// Too *short* a series is not an error — indicators that lack history simply
/// leave their leading entries undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// Validate `bars` and build a series, consuming the input.
    pub fn new(bars: Vec<DailyBar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    index: i,
                    date: bar.date,
                    close: bar.close,
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(SeriesError::NonMonotonicDates {
                    index: i,
                    prev: bars[i - 1].date,
                    next: bar.date,
                });
            }
        }

        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Trading dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}
