// =============================================================================
// Daily & Cumulative Returns
// =============================================================================
//
// daily_return[i]      = (close[i] - close[i-1]) / close[i-1]
// cumulative_return[i] = Π_{j=1..i} (1 + daily_return[j]), starting from 1.0
//
// Both are undefined at index 0 (no prior close to compare against). A
// constant-price series gives daily returns of 0 and a cumulative return of
// exactly 1.0 everywhere defined.

/// Day-over-day percentage change of the closes. `None` at index 0.
///
/// The series validator guarantees positive closes, so the division is safe.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    for i in 1..n {
        out[i] = Some((closes[i] - closes[i - 1]) / closes[i - 1]);
    }
    out
}

/// Running product of `(1 + r)` over the defined daily returns.
///
/// `None` wherever the daily return is (index 0). Element `i` is the growth
/// factor of a position opened at the first close and held through close `i`.
pub fn cumulative_returns(daily: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = vec![None; daily.len()];
    let mut acc = 1.0;
    for (i, r) in daily.iter().enumerate() {
        if let Some(r) = r {
            acc *= 1.0 + r;
            out[i] = Some(acc);
        }
    }
    out
}
