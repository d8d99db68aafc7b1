// =============================================================================
// Range Filter
// =============================================================================
//
//   filter_t = SMA(high - low, period)_t * multiplier
//   trend_t  =  1 if close_t > close_{t-1} + filter_t
//              -1 if close_t < close_{t-1} - filter_t
//              trend_{t-1} otherwise (and while the filter is undefined)
//
// The trend starts at 0 (no direction).
// =============================================================================

use super::sma::calculate_sma;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeFilter {
    pub filter: Vec<Option<f64>>,
    pub trend: Vec<i8>,
}

pub fn calculate_range_filter(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    multiplier: f64,
) -> RangeFilter {
    let n = closes.len().min(highs.len()).min(lows.len());
    let ranges: Vec<f64> = (0..n).map(|i| highs[i] - lows[i]).collect();
    let filter: Vec<Option<f64>> = calculate_sma(&ranges, period)
        .into_iter()
        .map(|v| v.map(|r| r * multiplier))
        .collect();

    let mut trend = vec![0i8; n];
    for i in 1..n {
        trend[i] = match filter[i] {
            Some(f) if closes[i] > closes[i - 1] + f => 1,
            Some(f) if closes[i] < closes[i - 1] - f => -1,
            _ => trend[i - 1],
        };
    }

    RangeFilter { filter, trend }
}

impl RangeFilter {
    /// Direction of the most recent bar (0 when empty).
    pub fn current_trend(&self) -> i8 {
        self.trend.last().copied().unwrap_or(0)
    }
}
