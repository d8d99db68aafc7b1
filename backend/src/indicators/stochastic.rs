// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
//   %K = 100 * (close - lowest_low_n) / (highest_high_n - lowest_low_n)
//   %D = SMA(%K, d_period)
// =============================================================================

use super::finite;
use super::sma::sma_of_series;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Lowest low and highest high of each trailing window of `period` bars.
pub(crate) fn rolling_extremes(
    highs: &[f64],
    lows: &[f64],
    period: usize,
) -> Vec<Option<(f64, f64)>> {
    let n = highs.len().min(lows.len());
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }
    for idx in period - 1..n {
        let start = idx + 1 - period;
        let hh = highs[start..=idx].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ll = lows[start..=idx].iter().copied().fold(f64::INFINITY, f64::min);
        if hh.is_finite() && ll.is_finite() {
            out[idx] = Some((ll, hh));
        }
    }
    out
}

/// # Edge cases
/// - A window with zero range (highest high == lowest low) leaves %K
///   undefined, and every %D window covering it.
pub fn calculate_stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticSeries {
    let extremes = rolling_extremes(highs, lows, k_period);
    let k: Vec<Option<f64>> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let (ll, hh) = extremes.get(i).copied().flatten()?;
            let range = hh - ll;
            if range == 0.0 {
                return None;
            }
            finite(100.0 * (close - ll) / range)
        })
        .collect();
    let d = sma_of_series(&k, d_period);
    StochasticSeries { k, d }
}
