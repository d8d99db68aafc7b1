// =============================================================================
// Williams %R
// =============================================================================
//
//   %R = -100 * (highest_high_n - close) / (highest_high_n - lowest_low_n)
//
// Ranges from -100 (close at the low) to 0 (close at the high).
// =============================================================================

use super::finite;
use super::stochastic::rolling_extremes;

/// Williams %R aligned with the input bars; zero range is undefined.
pub fn calculate_williams_r(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Vec<Option<f64>> {
    let extremes = rolling_extremes(highs, lows, period);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let (ll, hh) = extremes.get(i).copied().flatten()?;
            let range = hh - ll;
            if range == 0.0 {
                return None;
            }
            finite(-100.0 * (hh - close) / range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::latest;

    #[test]
    fn close_at_low_reads_minus_100() {
        let highs = vec![11.0; 15];
        let lows = vec![9.0; 15];
        let closes = vec![9.0; 15];
        let r = latest(&calculate_williams_r(&highs, &lows, &closes, 14)).unwrap();
        assert!((r + 100.0).abs() < 1e-10);
    }

    #[test]
    fn close_at_high_reads_zero() {
        let highs = vec![11.0; 15];
        let lows = vec![9.0; 15];
        let r = latest(&calculate_williams_r(&highs, &lows, &highs, 14)).unwrap();
        assert!(r.abs() < 1e-10);
    }

    #[test]
    fn zero_range_is_undefined() {
        let flat = vec![10.0; 15];
        assert!(latest(&calculate_williams_r(&flat, &flat, &flat, 14)).is_none());
    }
}
