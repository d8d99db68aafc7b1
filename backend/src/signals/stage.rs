// =============================================================================
// Market stage: Wyckoff-style cycle position from moving averages and volume
// =============================================================================
//
// Checked in priority order on the last bar:
//
//   Accumulation  close < SMA200 and volume > SMA20(volume)
//   Advancing     SMA50 > SMA200 and close > SMA50
//   Distribution  close > SMA200 and volume > SMA20(volume)
//   Declining     SMA50 < SMA200 and close < SMA50
//   Neutral       otherwise, including when any average is undefined
// =============================================================================

use serde::Serialize;

use crate::indicators::latest;
use crate::indicators::sma::calculate_sma;
use crate::market_data::PriceSeries;

const SHORT_MA: usize = 50;
const LONG_MA: usize = 200;
const VOLUME_MA: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MarketStage {
    Accumulation,
    Advancing,
    Distribution,
    Declining,
    #[default]
    Neutral,
}

impl MarketStage {
    pub fn identify(series: &PriceSeries) -> Self {
        let Some(last) = series.last() else {
            return Self::Neutral;
        };
        let closes = series.closes();
        let short = latest(&calculate_sma(&closes, SHORT_MA));
        let long = latest(&calculate_sma(&closes, LONG_MA));
        let volume_ma = latest(&calculate_sma(&series.volumes(), VOLUME_MA));

        let close = last.close;
        let heavy_volume = volume_ma.is_some_and(|v| last.volume > v);

        match (short, long) {
            (_, Some(l)) if close < l && heavy_volume => Self::Accumulation,
            (Some(s), Some(l)) if s > l && close > s => Self::Advancing,
            (_, Some(l)) if close > l && heavy_volume => Self::Distribution,
            (Some(s), Some(l)) if s < l && close < s => Self::Declining,
            _ => Self::Neutral,
        }
    }
}

impl std::fmt::Display for MarketStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Accumulation => "Accumulation",
            Self::Advancing => "Advancing",
            Self::Distribution => "Distribution",
            Self::Declining => "Declining",
            Self::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PriceBar;

    fn series(closes: &[f64], volumes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&c, &v))| PriceBar {
                timestamp: i as i64 * 86_400_000,
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: v,
            })
            .collect();
        PriceSeries::from_bars(bars)
    }

    #[test]
    fn short_history_is_neutral() {
        let s = series(&[100.0; 120], &[10.0; 120]);
        assert_eq!(MarketStage::identify(&s), MarketStage::Neutral);
        assert_eq!(MarketStage::identify(&PriceSeries::empty()), MarketStage::Neutral);
    }

    #[test]
    fn uptrend_on_flat_volume_is_advancing() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64).collect();
        let s = series(&closes, &vec![10.0; 250]);
        assert_eq!(MarketStage::identify(&s), MarketStage::Advancing);
    }

    #[test]
    fn downtrend_on_flat_volume_is_declining() {
        let closes: Vec<f64> = (0..250).map(|i| 400.0 - i as f64).collect();
        let s = series(&closes, &vec![10.0; 250]);
        assert_eq!(MarketStage::identify(&s), MarketStage::Declining);
    }

    #[test]
    fn volume_spike_below_long_average_is_accumulation() {
        let closes: Vec<f64> = (0..250).map(|i| 400.0 - i as f64).collect();
        let mut volumes = vec![10.0; 250];
        volumes[249] = 100.0;
        let s = series(&closes, &volumes);
        assert_eq!(MarketStage::identify(&s), MarketStage::Accumulation);
    }

    #[test]
    fn volume_spike_in_uptrend_prefers_advancing() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64).collect();
        let mut volumes = vec![10.0; 250];
        volumes[249] = 100.0;
        let s = series(&closes, &volumes);
        assert_eq!(MarketStage::identify(&s), MarketStage::Advancing);
    }
}
