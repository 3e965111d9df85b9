// =============================================================================
// Indicator Pipeline — PriceSeries -> IndicatorFrame
// =============================================================================
//
// The single batch transform of the backend. Takes a validated price series
// and produces every derived column in one pass, unconditionally — which
// indicators the dashboard actually draws is the frontend's decision, not
// ours. The frame is a pure derived view: recomputed in full from its input,
// never patched incrementally.

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::{bollinger, daily_returns, cumulative_returns, macd, rsi, sma};
use crate::runtime_config::IndicatorParams;
use crate::types::PriceSeries;

// =============================================================================
// IndicatorFrame
// =============================================================================

/// All derived columns for one price series, keyed by the same dates.
///
/// Every column has exactly one entry per input bar; `None` (JSON `null`)
/// marks the warm-up region where the indicator is not yet defined. Under
/// default settings `ma_fast`/`ma_slow` are the MA20/MA50 of the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorFrame {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub ma_fast: Vec<Option<f64>>,
    pub ma_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub bb_high: Vec<Option<f64>>,
    pub bb_low: Vec<Option<f64>>,
    pub daily_return: Vec<Option<f64>>,
    pub cumulative_return: Vec<Option<f64>>,
}

impl IndicatorFrame {
    /// Compute the full frame from `series` with the given parameters.
    ///
    /// Stateless and side-effect free; safe to call repeatedly or from
    /// multiple tasks on independent inputs. A series shorter than some
    /// indicator's window leaves that column entirely undefined rather than
    /// failing.
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> Self {
        let closes = series.closes();

        let macd_out = macd(
            &closes,
            params.macd_fast,
            params.macd_slow,
            params.macd_signal,
        );
        let bands = bollinger(&closes, params.bollinger_window, params.bollinger_k);
        let daily = daily_returns(&closes);
        let cumulative = cumulative_returns(&daily);

        Self {
            dates: series.dates(),
            ma_fast: sma(&closes, params.ma_fast),
            ma_slow: sma(&closes, params.ma_slow),
            rsi: rsi(&closes, params.rsi_period),
            macd: macd_out.macd,
            macd_signal: macd_out.signal,
            bb_high: bands.upper,
            bb_low: bands.lower,
            daily_return: daily,
            cumulative_return: cumulative,
            close: closes,
        }
    }

    /// Number of rows (== number of input bars).
    pub fn rows(&self) -> usize {
        self.dates.len()
    }

    /// Aggregate return metrics for the dashboard's summary panel.
    ///
    /// Returns `None` when no daily return is defined yet (a single-bar
    /// series).
    pub fn return_summary(&self) -> Option<ReturnSummary> {
        ReturnSummary::from_daily_returns(&self.daily_return)
    }
}

// =============================================================================
// ReturnSummary
// =============================================================================

/// Mean and volatility of the defined daily returns, rounded to 4 decimal
/// places for display.
///
/// Volatility uses the sample (N-1) standard deviation. Note the asymmetry
/// with the Bollinger kernel, which uses the population divisor — both
/// choices are part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnSummary {
    pub mean_daily_return: f64,
    pub volatility: f64,
}

impl ReturnSummary {
    fn from_daily_returns(daily: &[Option<f64>]) -> Option<Self> {
        let defined: Vec<f64> = daily.iter().flatten().copied().collect();
        if defined.is_empty() {
            return None;
        }

        let n = defined.len() as f64;
        let mean = defined.iter().sum::<f64>() / n;

        // Sample standard deviation; zero for a single observation.
        let volatility = if defined.len() > 1 {
            let var = defined.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };

        Some(Self {
            mean_daily_return: round4(mean),
            volatility: round4(volatility),
        })
    }
}

/// Round to 4 decimal places for display.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyBar;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: start + chrono::Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn ramp() -> PriceSeries {
        // 100, 101, ..., 149 — fifty points, the longest window exactly.
        let closes: Vec<f64> = (100..150).map(|x| x as f64).collect();
        series_from_closes(&closes)
    }

    #[test]
    fn frame_has_one_row_per_bar() {
        let series = ramp();
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());

        assert_eq!(frame.rows(), 50);
        assert_eq!(frame.dates, series.dates());
        for len in [
            frame.close.len(),
            frame.ma_fast.len(),
            frame.ma_slow.len(),
            frame.rsi.len(),
            frame.macd.len(),
            frame.macd_signal.len(),
            frame.bb_high.len(),
            frame.bb_low.len(),
            frame.daily_return.len(),
            frame.cumulative_return.len(),
        ] {
            assert_eq!(len, 50);
        }
    }

    #[test]
    fn frame_warm_up_indices_under_defaults() {
        let frame = IndicatorFrame::compute(&ramp(), &IndicatorParams::default());

        assert_eq!(frame.ma_fast[18], None);
        assert!(frame.ma_fast[19].is_some());
        assert_eq!(frame.ma_slow[48], None);
        assert!(frame.ma_slow[49].is_some());
        assert_eq!(frame.rsi[13], None);
        assert!(frame.rsi[14].is_some());
        assert_eq!(frame.macd[24], None);
        assert!(frame.macd[25].is_some());
        assert_eq!(frame.macd_signal[32], None);
        assert!(frame.macd_signal[33].is_some());
        assert_eq!(frame.bb_high[18], None);
        assert!(frame.bb_high[19].is_some());
        assert_eq!(frame.daily_return[0], None);
        assert!(frame.daily_return[1].is_some());
    }

    #[test]
    fn frame_known_values_on_ramp() {
        let frame = IndicatorFrame::compute(&ramp(), &IndicatorParams::default());

        // MA20 at index 19 = mean(100..=119) = 109.5.
        assert!((frame.ma_fast[19].unwrap() - 109.5).abs() < 1e-10);
        // MA50 at index 49 = mean(100..=149) = 124.5.
        assert!((frame.ma_slow[49].unwrap() - 124.5).abs() < 1e-10);
        // Daily return at index 1 = 1/100.
        assert!((frame.daily_return[1].unwrap() - 0.01).abs() < 1e-12);
        // Monotone rise => RSI pegged at 100, cumulative return increasing.
        assert_eq!(frame.rsi[14], Some(100.0));
        let mut prev = 1.0;
        for v in frame.cumulative_return.iter().flatten() {
            assert!(*v > prev);
            prev = *v;
        }
    }

    #[test]
    fn frame_short_series_leaves_columns_undefined() {
        // 10 bars: returns are defined, everything windowed is not.
        let series = series_from_closes(&[100.0, 102.0, 101.0, 105.0, 103.0, 104.0, 106.0, 105.5,
            107.0, 108.0]);
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());

        assert_eq!(frame.rows(), 10);
        assert!(frame.ma_fast.iter().all(Option::is_none));
        assert!(frame.ma_slow.iter().all(Option::is_none));
        assert!(frame.rsi.iter().all(Option::is_none));
        assert!(frame.macd.iter().all(Option::is_none));
        assert!(frame.bb_high.iter().all(Option::is_none));
        assert!(frame.daily_return[1].is_some());
    }

    #[test]
    fn frame_degenerate_constant_series() {
        let series = series_from_closes(&[250.0; 60]);
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());

        for v in frame.daily_return.iter().flatten() {
            assert_eq!(*v, 0.0);
        }
        for v in frame.cumulative_return.iter().flatten() {
            assert_eq!(*v, 1.0);
        }
        for v in frame.rsi.iter().flatten() {
            assert_eq!(*v, 100.0);
        }
        for v in frame.macd.iter().flatten() {
            assert!(v.abs() < 1e-10);
        }
        for i in 19..60 {
            assert!((frame.bb_high[i].unwrap() - 250.0).abs() < 1e-10);
            assert!((frame.bb_low[i].unwrap() - 250.0).abs() < 1e-10);
        }

        let summary = frame.return_summary().unwrap();
        assert_eq!(summary.mean_daily_return, 0.0);
        assert_eq!(summary.volatility, 0.0);
    }

    #[test]
    fn bollinger_envelope_ordering_in_frame() {
        let closes: Vec<f64> = (0..60)
            .map(|x| 100.0 + (x as f64 * 0.5).sin() * 8.0)
            .collect();
        let frame = IndicatorFrame::compute(&series_from_closes(&closes), &IndicatorParams::default());
        for i in 0..60 {
            if let (Some(high), Some(low)) = (frame.bb_high[i], frame.bb_low[i]) {
                assert!(high >= low);
            }
        }
    }

    #[test]
    fn summary_rounds_to_four_decimals() {
        // Two bars, daily return exactly 1/3: mean rounds to 0.3333 and the
        // single-observation volatility is 0.
        let series = series_from_closes(&[3.0, 4.0]);
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());
        let summary = frame.return_summary().unwrap();
        assert_eq!(summary.mean_daily_return, 0.3333);
        assert_eq!(summary.volatility, 0.0);
    }

    #[test]
    fn summary_undefined_for_single_bar() {
        let series = series_from_closes(&[100.0]);
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());
        assert!(frame.return_summary().is_none());
    }
}
