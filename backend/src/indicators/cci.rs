// =============================================================================
// Commodity Channel Index (CCI)
// =============================================================================
//
//   TP  = (high + low + close) / 3
//   CCI = (TP - SMA(TP, n)) / (0.015 * mean_deviation(TP, n))
// =============================================================================

use super::finite;

const LAMBERT_CONSTANT: f64 = 0.015;

/// CCI series aligned with the input bars.
///
/// # Edge cases
/// - A window with zero mean deviation (flat typical price) is undefined.
pub fn calculate_cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len().min(highs.len()).min(lows.len());
    let mut out = vec![None; closes.len()];
    if period == 0 || n < period {
        return out;
    }

    let typical: Vec<f64> = (0..n).map(|i| (highs[i] + lows[i] + closes[i]) / 3.0).collect();

    for (i, window) in typical.windows(period).enumerate() {
        let idx = i + period - 1;
        let mean = window.iter().sum::<f64>() / period as f64;
        let mean_dev = window.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;
        if mean_dev == 0.0 {
            continue;
        }
        out[idx] = finite((typical[idx] - mean) / (LAMBERT_CONSTANT * mean_dev));
    }
    out
}
