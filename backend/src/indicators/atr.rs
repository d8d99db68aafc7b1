// =============================================================================
// Average True Range (ATR): Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// Default period: 14
// =============================================================================

use super::finite;

/// True range of every bar after the first; element `i` belongs to bar
/// `i + 1`.
pub(crate) fn true_ranges(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    (1..n)
        .map(|i| {
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - closes[i - 1]).abs();
            let lc = (lows[i] - closes[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// ATR series aligned with the input bars; the first defined value sits at
/// index `period`.
///
/// # Edge cases
/// - `period == 0` or fewer than `period + 1` bars => undefined everywhere
/// - A non-finite intermediate value stops the series.
pub fn calculate_atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    let tr_values = true_ranges(highs, lows, closes);
    if period == 0 || tr_values.len() < period {
        return out;
    }

    // --- Seed ATR with SMA of first `period` TR values -----------------------
    let Some(mut atr) = finite(tr_values[..period].iter().sum::<f64>() / period as f64) else {
        return out;
    };
    out[period] = Some(atr);

    // --- Wilder's smoothing for remaining TR values --------------------------
    let period_f = period as f64;
    for (offset, &tr) in tr_values[period..].iter().enumerate() {
        match finite((atr * (period_f - 1.0) + tr) / period_f) {
            Some(next) => {
                atr = next;
                out[period + 1 + offset] = Some(atr);
            }
            None => break,
        }
    }

    out
}
