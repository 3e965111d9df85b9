// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// MACD line   = EMA(fast) - EMA(slow) of the closing price.
// Signal line = EMA(signal_period) of the MACD line itself.
//
// Both EMAs use the SMA-seeded convention from `ema.rs`, so with the standard
// 12/26/9 settings the MACD line is first defined at index 25 (the slow EMA's
// seed) and the signal line at index 33 (nine defined MACD values later).

use super::ema::ema;

/// MACD line and its signal line, both aligned with the input closes.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

/// Compute MACD and signal columns for `closes`.
///
/// The MACD line is defined wherever *both* EMAs are. The signal EMA runs
/// over the defined portion of the MACD line (which is contiguous once it
/// starts) and is mapped back to the original indices.
///
/// # Edge cases
/// - Input shorter than the slow period => all-`None` MACD and signal.
/// - Fewer defined MACD values than `signal_period` => all-`None` signal.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let n = closes.len();

    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let mut line = vec![None; n];
    for i in 0..n {
        if let (Some(f), Some(s)) = (fast_ema[i], slow_ema[i]) {
            line[i] = Some(f - s);
        }
    }

    // Signal: EMA over the defined MACD values, re-anchored at the first
    // defined index.
    let mut signal = vec![None; n];
    if let Some(offset) = line.iter().position(Option::is_some) {
        let defined: Vec<f64> = line[offset..].iter().map(|v| v.unwrap()).collect();
        for (j, v) in ema(&defined, signal_period).into_iter().enumerate() {
            signal[offset + j] = v;
        }
    }

    MacdSeries { macd: line, signal }
}
