// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = x_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the SMA of the first `period` defined
// values. An undefined input restarts the seeding from the next run of
// defined values, which is what lets MACD run its signal EMA over a MACD line
// with a warm-up gap.
// =============================================================================

use super::{defined, finite};

/// EMA of a raw column.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    ema_of_series(&defined(values), period)
}

/// EMA of an aligned series that may contain undefined points.
///
/// # Edge cases
/// - `period == 0` => every position undefined
/// - Fewer than `period` consecutive defined values => undefined
/// - A non-finite intermediate value restarts the seed.
pub fn ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let mut seed_sum = 0.0;
    let mut seed_len = 0usize;
    let mut prev: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = *value else {
            seed_sum = 0.0;
            seed_len = 0;
            prev = None;
            continue;
        };

        match prev {
            Some(p) => {
                prev = finite(x * multiplier + p * (1.0 - multiplier));
                if prev.is_none() {
                    seed_sum = 0.0;
                    seed_len = 0;
                }
            }
            None => {
                seed_sum += x;
                seed_len += 1;
                if seed_len == period {
                    prev = finite(seed_sum / period as f64);
                    seed_sum = 0.0;
                    seed_len = 0;
                }
            }
        }
        out[i] = prev;
    }

    out
}
