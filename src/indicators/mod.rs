// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator kernels over a slice of closing prices.
// Every function returns a column *aligned* with its input: element `i` of
// the output belongs to close `i`, and `None` marks the warm-up region where
// not enough trailing history exists yet. An input shorter than the window
// produces an all-`None` column, never an error — callers tolerate partial
// leading values.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger, BollingerSeries};
pub use ema::ema;
pub use macd::{macd, MacdSeries};
pub use returns::{cumulative_returns, daily_returns};
pub use rsi::rsi;
pub use sma::sma;
