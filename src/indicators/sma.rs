// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_i = mean(close[i - window + 1 ..= i]) — the unweighted mean over the
// trailing window, inclusive of the current close.

/// Compute the SMA column for `closes` with the given trailing `window`.
///
/// Element `i` is `Some` for `i >= window - 1` and `None` before that.
/// A rolling sum keeps the pass O(n).
///
/// # Edge cases
/// - `window == 0` => all-`None` column (division guard)
/// - `closes.len() < window` => all-`None` column
pub fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if window == 0 || n < window {
        return out;
    }

    let window_f = window as f64;
    let mut sum: f64 = closes[..window].iter().sum();
    out[window - 1] = Some(sum / window_f);

    for i in window..n {
        sum += closes[i] - closes[i - window];
        out[i] = Some(sum / window_f);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_empty_input() {
        assert!(sma(&[], 20).iter().all(Option::is_none));
    }

    #[test]
    fn sma_window_zero() {
        let out = sma(&[1.0, 2.0, 3.0], 0);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn sma_insufficient_data_is_all_undefined() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = sma(&closes, 20);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn sma_warm_up_boundary() {
        let closes: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        let out = sma(&closes, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0)); // (1+2+3)/3
        assert_eq!(out[3], Some(3.0));
        assert_eq!(out[4], Some(4.0));
    }

    #[test]
    fn sma20_on_linear_ramp() {
        // closes 100, 101, ..., 149: MA20 at index 19 = mean(100..=119) = 109.5
        let closes: Vec<f64> = (100..150).map(|x| x as f64).collect();
        let out = sma(&closes, 20);
        assert!(out[..19].iter().all(Option::is_none));
        assert!((out[19].unwrap() - 109.5).abs() < 1e-10);
        // Each later value is the previous plus 1 (the ramp step).
        assert!((out[20].unwrap() - 110.5).abs() < 1e-10);
        assert!((out[49].unwrap() - 139.5).abs() < 1e-10);
    }

    #[test]
    fn sma_matches_direct_mean() {
        let closes = vec![44.3, 44.1, 44.6, 43.9, 44.8, 45.2, 44.7];
        let out = sma(&closes, 4);
        for i in 3..closes.len() {
            let mean: f64 = closes[i - 3..=i].iter().sum::<f64>() / 4.0;
            assert!((out[i].unwrap() - mean).abs() < 1e-10);
        }
    }
}
