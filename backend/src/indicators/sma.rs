// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_t = (x_{t-n+1} + ... + x_t) / n
//
// A position is defined only when every value in its window is defined.
// =============================================================================

use super::{defined, finite};

/// SMA of a raw column.
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    sma_of_series(&defined(values), period)
}

/// SMA of an aligned series that may contain undefined points.
///
/// # Edge cases
/// - `period == 0` => every position undefined
/// - An undefined value anywhere in a window makes that position undefined.
pub fn sma_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for (i, window) in values.windows(period).enumerate() {
        let sum: Option<f64> = window.iter().copied().sum();
        out[i + period - 1] = sum.and_then(|s| finite(s / period as f64));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_aligned_with_input() {
        let out = calculate_sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn sma_short_input_is_undefined() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 5), vec![None, None]);
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn undefined_point_poisons_its_windows() {
        let out = sma_of_series(&[Some(1.0), None, Some(3.0), Some(5.0)], 2);
        assert_eq!(out, vec![None, None, None, Some(4.0)]);
    }
}
