// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// Trend strength without direction. Directional moves and true ranges are
// Wilder-summed over `period` transitions, turned into +DI / -DI, and the
// spread between them (DX) is Wilder-averaged once more into ADX.
// =============================================================================

use super::atr::true_ranges;
use super::finite;

/// ADX series aligned with the input bars.
///
/// The first defined value needs `2 * period` bars after the first one:
/// `period` transitions seed the smoothed +DM/-DM/TR and `period` DX values
/// seed the ADX average.
///
/// # Edge cases
/// - `period == 0` or mismatched column lengths => undefined everywhere
/// - A bar whose smoothed TR is zero has no DX; it is skipped, not counted
///   towards the ADX seed.
pub fn calculate_adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || highs.len() != n || lows.len() != n || n < 2 * period + 1 {
        return out;
    }

    let period_f = period as f64;

    let tr_vals = true_ranges(highs, lows, closes);
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    for i in 1..n {
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
    }

    // Transition i ends on bar i + 1.
    let mut smooth_plus: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr_vals[..period].iter().sum();

    let mut dx_values: Vec<(usize, f64)> = Vec::with_capacity(n);
    if let Some(dx) = compute_dx(smooth_plus, smooth_minus, smooth_tr) {
        dx_values.push((period, dx));
    }
    for i in period..tr_vals.len() {
        smooth_plus = smooth_plus - smooth_plus / period_f + plus_dm[i];
        smooth_minus = smooth_minus - smooth_minus / period_f + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr_vals[i];
        if let Some(dx) = compute_dx(smooth_plus, smooth_minus, smooth_tr) {
            dx_values.push((i + 1, dx));
        }
    }

    if dx_values.len() < period {
        return out;
    }

    let seed = dx_values[..period].iter().map(|(_, dx)| dx).sum::<f64>() / period_f;
    let Some(mut adx) = finite(seed) else {
        return out;
    };
    out[dx_values[period - 1].0] = Some(adx);

    for &(idx, dx) in &dx_values[period..] {
        match finite((adx * (period_f - 1.0) + dx) / period_f) {
            Some(next) => {
                adx = next;
                out[idx] = Some(adx);
            }
            None => break,
        }
    }

    out
}

/// DX for one set of smoothed sums. Undefined when the range sum is zero;
/// zero when neither side moved.
fn compute_dx(plus: f64, minus: f64, range: f64) -> Option<f64> {
    if range == 0.0 {
        return None;
    }
    // The range divides out of the DI ratio.
    match plus + minus {
        total if total == 0.0 => Some(0.0),
        total => finite((plus - minus).abs() / total * 100.0),
    }
}
