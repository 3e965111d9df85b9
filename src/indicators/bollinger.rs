// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ) over a trailing window of closes.
//
// σ is the *population* standard deviation (divisor N, not N-1) of the
// window. That divisor is part of the output contract: the sample divisor
// produces materially different bands over the first window's worth of data.

use super::sma::sma;

/// Upper / middle / lower band columns, aligned with the input closes.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Compute Bollinger Bands for `closes` with the given trailing `window` and
/// band width `k` (in standard deviations).
///
/// Element `i` of every band is `Some` for `i >= window - 1` and `None`
/// before that. Since k*σ >= 0, `upper >= middle >= lower` holds at every
/// defined index (for k >= 0).
///
/// # Edge cases
/// - `window == 0` => all-`None` columns
/// - `closes.len() < window` => all-`None` columns
/// - Flat window => σ = 0, all three bands coincide
pub fn bollinger(closes: &[f64], window: usize, k: f64) -> BollingerSeries {
    let n = closes.len();
    let middle = sma(closes, window);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    if window == 0 || n < window {
        return BollingerSeries {
            upper,
            middle,
            lower,
        };
    }

    let window_f = window as f64;
    for i in (window - 1)..n {
        let mean = middle[i].expect("middle band defined from window - 1");
        let slice = &closes[i + 1 - window..=i];
        let variance = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / window_f;
        let std_dev = variance.sqrt();
        upper[i] = Some(mean + k * std_dev);
        lower[i] = Some(mean - k * std_dev);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}
