// =============================================================================
// Money Flow Index (MFI)
// =============================================================================
//
// Volume-weighted RSI over the typical price:
//   TP        = (high + low + close) / 3
//   raw flow  = TP * volume
//   positive  = sum of raw flow where TP rose, over n transitions
//   negative  = sum of raw flow where TP fell, over n transitions
//   MFI       = 100 - 100 / (1 + positive / negative)
// =============================================================================

use super::finite;

/// MFI aligned with the input bars; the first defined value sits at index
/// `period`.
///
/// # Edge cases
/// - Negative flow zero with positive flow => 100
/// - Both flows zero => undefined
pub fn calculate_mfi(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    period: usize,
) -> Vec<Option<f64>> {
    let n = closes.len().min(highs.len()).min(lows.len()).min(volumes.len());
    let mut out = vec![None; closes.len()];
    if period == 0 || n < period + 1 {
        return out;
    }

    let typical: Vec<f64> = (0..n).map(|i| (highs[i] + lows[i] + closes[i]) / 3.0).collect();

    // Signed flow per transition; element i belongs to bar i + 1.
    let flows: Vec<(f64, f64)> = (1..n)
        .map(|i| {
            let raw = typical[i] * volumes[i];
            if typical[i] > typical[i - 1] {
                (raw, 0.0)
            } else if typical[i] < typical[i - 1] {
                (0.0, raw)
            } else {
                (0.0, 0.0)
            }
        })
        .collect();

    for (i, window) in flows.windows(period).enumerate() {
        let idx = i + period;
        let (pos, neg) = window
            .iter()
            .fold((0.0, 0.0), |(p, m), &(fp, fm)| (p + fp, m + fm));
        out[idx] = if neg == 0.0 && pos == 0.0 {
            None
        } else if neg == 0.0 {
            Some(100.0)
        } else {
            finite(100.0 - 100.0 / (1.0 + pos / neg))
        };
    }
    out
}
