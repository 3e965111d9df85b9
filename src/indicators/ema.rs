// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// Seeding convention: the first EMA value is the SMA of the first `period`
// closes, placed at index `period - 1`. Smoothing applies from there on. The
// seeding choice affects the first ~period values materially, so it is fixed
// here and relied on by the MACD warm-up arithmetic.

/// Compute the EMA column for `closes` with the given look-back `period`.
///
/// Element `i` is `Some` for `i >= period - 1` (the seed lands at
/// `period - 1`) and `None` before that.
///
/// # Edge cases
/// - `period == 0` => all-`None` column (division guard)
/// - `closes.len() < period` => all-`None` column
pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` values.
    let seed: f64 = closes[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        let value = closes[i] * multiplier + prev * (1.0 - multiplier);
        out[i] = Some(value);
        prev = value;
    }

    out
}
