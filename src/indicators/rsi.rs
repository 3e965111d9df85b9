// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Degenerate policy: whenever the average loss is zero — including a
// perfectly flat series — RSI is exactly 100.

/// Compute the RSI column for `closes` with the given `period`.
///
/// One delta is consumed per bar, so element `i` is `Some` for `i >= period`
/// (the first `period + 1` closes seed the averages) and `None` before that.
/// Every defined value lies in [0, 100].
///
/// # Edge cases
/// - `period == 0` => all-`None` column
/// - `closes.len() < period + 1` => all-`None` column (need `period` deltas)
/// - `avg_loss == 0` => RSI = 100.0 exactly
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed averages with the SMA of the first `period` deltas.
    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // Wilder's smoothing for subsequent values. Delta `j` belongs to close
    // `j + 1`.
    for (j, &delta) in deltas.iter().enumerate().skip(period) {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        out[j + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    out
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// A zero average loss means no down moves survived the smoothing window, so
/// RSI saturates at 100 — also the defined answer for a flat series.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
