// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same window.

use super::finite;

/// Upper, middle and lower bands aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// # Edge cases
/// - Fewer than `period` closes, or `period == 0` => undefined everywhere
/// - A window containing a non-finite close is undefined.
/// - `upper >= middle >= lower` wherever defined.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let n = closes.len();
    let mut out = BollingerSeries {
        upper: vec![None; n],
        middle: vec![None; n],
        lower: vec![None; n],
    };
    if period == 0 || n < period {
        return out;
    }

    for (i, window) in closes.windows(period).enumerate() {
        let idx = i + period - 1;
        let Some(middle) = finite(window.iter().sum::<f64>() / period as f64) else {
            continue;
        };
        let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
        let Some(width) = finite(num_std.abs() * variance.sqrt()) else {
            continue;
        };

        out.middle[idx] = Some(middle);
        out.upper[idx] = finite(middle + width);
        out.lower[idx] = finite(middle - width);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::latest;
    use proptest::prelude::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0);
        let (upper, middle, lower) = (
            latest(&bb.upper).unwrap(),
            latest(&bb.middle).unwrap(),
            latest(&bb.lower).unwrap(),
        );
        assert!((middle - 10.5).abs() < 1e-10);
        assert!(upper > middle);
        assert!(lower < middle);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(bb.middle.iter().all(Option::is_none));
    }

    #[test]
    fn flat_series_collapses_bands() {
        let bb = calculate_bollinger(&[100.0; 25], 20, 2.0);
        assert_eq!(latest(&bb.upper), Some(100.0));
        assert_eq!(latest(&bb.lower), Some(100.0));
    }

    proptest! {
        #[test]
        fn bands_are_ordered(closes in prop::collection::vec(1.0f64..100_000.0, 20..120)) {
            let bb = calculate_bollinger(&closes, 20, 2.0);
            for i in 0..closes.len() {
                if let (Some(u), Some(m), Some(l)) = (bb.upper[i], bb.middle[i], bb.lower[i]) {
                    prop_assert!(u >= m && m >= l);
                }
            }
        }
    }
}
