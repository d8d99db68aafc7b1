// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators feeding the
// decision engine and the signal board. Every series function returns a
// vector aligned 1:1 with its input where undefined positions (warm-up,
// division by zero, non-finite arithmetic) are `None`. Callers read the tail
// with [`latest`]; nothing in this module panics or emits NaN/Inf.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod range_filter;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod stochastic;
pub mod volatility;
pub mod williams_r;

pub use snapshot::{IndicatorParams, IndicatorSnapshot};

/// Most recent value of an aligned series.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// `Some(v)` only when `v` is finite.
pub(crate) fn finite(v: f64) -> Option<f64> {
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Lift a raw column into an aligned series, marking non-finite inputs
/// undefined.
pub(crate) fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| finite(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_reads_tail() {
        assert_eq!(latest(&[Some(1.0), Some(2.0)]), Some(2.0));
        assert_eq!(latest(&[Some(1.0), None]), None);
        assert_eq!(latest(&[]), None);
    }

    #[test]
    fn finite_filters_nan_and_inf() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
    }
}
