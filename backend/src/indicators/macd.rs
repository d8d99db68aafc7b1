// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal) of the macd line
//   histogram = macd - signal
// =============================================================================

use super::ema::{calculate_ema, ema_of_series};
use super::finite;

/// MACD line, signal line and histogram, each aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// # Edge cases
/// - The macd line is defined from index `slow - 1`; the signal line needs a
///   further `signal - 1` bars.
/// - Any zero window leaves every series undefined.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => finite(f - s),
            _ => None,
        })
        .collect();

    let signal_line = ema_of_series(&macd, signal);

    let histogram = macd
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => finite(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::latest;

    #[test]
    fn warm_up_positions() {
        let closes: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        let out = calculate_macd(&closes, 12, 26, 9);
        assert!(out.macd[24].is_none());
        assert!(out.macd[25].is_some());
        assert!(out.signal[32].is_none());
        assert!(out.signal[33].is_some());
        assert!(out.histogram[33].is_some());
    }

    #[test]
    fn rising_prices_have_positive_macd() {
        let closes: Vec<f64> = (1..=80).map(|x| 100.0 + x as f64 * 2.0).collect();
        let out = calculate_macd(&closes, 12, 26, 9);
        assert!(latest(&out.macd).unwrap() > 0.0);
    }

    #[test]
    fn flat_prices_have_zero_histogram() {
        let out = calculate_macd(&[50.0; 60], 12, 26, 9);
        assert!(latest(&out.histogram).unwrap().abs() < 1e-10);
    }

    #[test]
    fn short_series_is_undefined() {
        let out = calculate_macd(&[1.0, 2.0, 3.0], 12, 26, 9);
        assert!(latest(&out.macd).is_none());
        assert!(latest(&out.signal).is_none());
    }
}
