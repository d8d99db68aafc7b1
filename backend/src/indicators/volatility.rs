// =============================================================================
// Return volatility and volume trend
// =============================================================================

use super::finite;

const VOLUME_EPSILON: f64 = 1e-9;

/// Sample standard deviation of close-to-close percent returns, in percent.
///
/// # Edge cases
/// - Fewer than three closes (fewer than two returns) => `None`
/// - Returns from a zero previous close are skipped.
pub fn return_volatility(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .filter_map(|w| finite((w[1] - w[0]) / w[0] * 100.0))
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    finite(variance.sqrt())
}

/// Ratio of the mean volume over the last `short` bars to the mean over the
/// last `long` bars.
///
/// With `long` bars or fewer the ratio is 1.0. The denominator is floored at
/// a small epsilon so a silent volume column never divides by zero.
pub fn volume_trend(volumes: &[f64], short: usize, long: usize) -> f64 {
    if short == 0 || long == 0 || volumes.len() <= long {
        return 1.0;
    }
    let mean = |w: &[f64]| w.iter().sum::<f64>() / w.len() as f64;
    let recent = mean(&volumes[volumes.len() - short.min(volumes.len())..]);
    let baseline = mean(&volumes[volumes.len() - long..]).max(VOLUME_EPSILON);
    finite(recent / baseline).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_returns_have_zero_volatility() {
        let closes = [100.0, 100.0, 100.0, 100.0];
        assert_eq!(return_volatility(&closes), Some(0.0));
    }

    #[test]
    fn volatility_in_percent() {
        // Returns: +1%, -1% => mean 0, sample std = sqrt(2) ≈ 1.414
        let closes = [100.0, 101.0, 99.99];
        let vol = return_volatility(&closes).unwrap();
        assert!((vol - 2f64.sqrt()).abs() < 1e-3, "got {vol}");
    }

    #[test]
    fn too_few_closes() {
        assert_eq!(return_volatility(&[1.0, 2.0]), None);
    }

    #[test]
    fn volume_trend_short_history_is_one() {
        assert_eq!(volume_trend(&[1.0; 20], 5, 20), 1.0);
    }

    #[test]
    fn volume_trend_detects_surge() {
        let mut volumes = vec![100.0; 16];
        volumes.extend([300.0; 5]);
        // recent mean 300; last-20 mean = (15*100 + 5*300)/20 = 150
        assert!((volume_trend(&volumes, 5, 20) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn silent_volume_does_not_divide_by_zero() {
        assert_eq!(volume_trend(&[0.0; 30], 5, 20), 0.0);
    }
}
