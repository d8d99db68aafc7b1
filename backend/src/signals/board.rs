// =============================================================================
// Signal Board: per-indicator buy/sell flags
// =============================================================================
//
//   macd    buy: line > signal and histogram > 0     sell: mirror
//   stoch   buy: K, D < 20 and K > D                 sell: K, D > 80 and K < D
//   obv     buy: OBV > SMA20(OBV)                    sell: OBV < SMA20(OBV)
//   bb      buy: close < lower                       sell: close > upper
//   rf      buy: range-filter trend = +1             sell: trend = -1
//   rsi     buy: RSI < 30                            sell: RSI > 70
//
// An undefined operand leaves both flags of that indicator false.
// =============================================================================

use serde::Serialize;

use crate::indicators::bollinger::calculate_bollinger;
use crate::indicators::macd::calculate_macd;
use crate::indicators::obv::calculate_obv;
use crate::indicators::range_filter::calculate_range_filter;
use crate::indicators::rsi::calculate_rsi;
use crate::indicators::sma::sma_of_series;
use crate::indicators::stochastic::calculate_stochastic;
use crate::indicators::{latest, IndicatorParams};
use crate::market_data::PriceSeries;

const STOCH_OVERSOLD: f64 = 20.0;
const STOCH_OVERBOUGHT: f64 = 80.0;
const OBV_SMA_PERIOD: usize = 20;
const RANGE_FILTER_PERIOD: usize = 20;
const RANGE_FILTER_MULTIPLIER: f64 = 1.6;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalPair {
    pub buy: bool,
    pub sell: bool,
}

impl SignalPair {
    fn new(buy: bool, sell: bool) -> Self {
        Self { buy, sell }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalBoard {
    pub macd: SignalPair,
    pub stochastic: SignalPair,
    pub obv: SignalPair,
    pub bollinger: SignalPair,
    pub range_filter: SignalPair,
    pub rsi: SignalPair,
}

impl SignalBoard {
    fn pairs(&self) -> [SignalPair; 6] {
        [self.macd, self.stochastic, self.obv, self.bollinger, self.range_filter, self.rsi]
    }

    pub fn buy_count(&self) -> usize {
        self.pairs().iter().filter(|p| p.buy).count()
    }

    pub fn sell_count(&self) -> usize {
        self.pairs().iter().filter(|p| p.sell).count()
    }

    /// Evaluate every flag on the tail of `series`.
    pub fn evaluate(series: &PriceSeries, params: &IndicatorParams) -> Self {
        if series.is_empty() {
            return Self::default();
        }

        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();

        let macd = calculate_macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
        let macd = match (latest(&macd.macd), latest(&macd.signal), latest(&macd.histogram)) {
            (Some(line), Some(signal), Some(hist)) => {
                SignalPair::new(line > signal && hist > 0.0, line < signal && hist < 0.0)
            }
            _ => SignalPair::default(),
        };

        let stoch = calculate_stochastic(&highs, &lows, &closes, params.stoch_k, params.stoch_d);
        let stochastic = match (latest(&stoch.k), latest(&stoch.d)) {
            (Some(k), Some(d)) => SignalPair::new(
                k < STOCH_OVERSOLD && d < STOCH_OVERSOLD && k > d,
                k > STOCH_OVERBOUGHT && d > STOCH_OVERBOUGHT && k < d,
            ),
            _ => SignalPair::default(),
        };

        let obv_series = calculate_obv(&closes, &volumes);
        let obv_sma = sma_of_series(&obv_series, OBV_SMA_PERIOD);
        let obv = match (latest(&obv_series), latest(&obv_sma)) {
            (Some(o), Some(m)) => SignalPair::new(o > m, o < m),
            _ => SignalPair::default(),
        };

        let bb = calculate_bollinger(&closes, params.bb_period, params.bb_std);
        let close = closes.last().copied();
        let bollinger = match (close, latest(&bb.lower), latest(&bb.upper)) {
            (Some(c), Some(lower), Some(upper)) => SignalPair::new(c < lower, c > upper),
            _ => SignalPair::default(),
        };

        let rf = calculate_range_filter(&highs, &lows, &closes, RANGE_FILTER_PERIOD, RANGE_FILTER_MULTIPLIER);
        let trend = rf.current_trend();
        let range_filter = SignalPair::new(trend == 1, trend == -1);

        let rsi = match latest(&calculate_rsi(&closes, params.rsi_period)) {
            Some(r) => SignalPair::new(r < RSI_OVERSOLD, r > RSI_OVERBOUGHT),
            None => SignalPair::default(),
        };

        Self {
            macd,
            stochastic,
            obv,
            bollinger,
            range_filter,
            rsi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PriceBar;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: i as i64 * 300_000,
                open: c,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
                volume: 1_000.0,
            })
            .collect();
        PriceSeries::from_bars(bars)
    }

    #[test]
    fn empty_series_has_no_flags() {
        let board = SignalBoard::evaluate(&PriceSeries::empty(), &IndicatorParams::default());
        assert_eq!(board, SignalBoard::default());
        assert_eq!(board.buy_count(), 0);
    }

    #[test]
    fn steady_rally_flags_overbought_and_trend() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * 2.0).collect();
        let board = SignalBoard::evaluate(&series_from_closes(&closes), &IndicatorParams::default());
        // Straight-line rally: RSI pinned at 100, OBV rising above its mean.
        assert!(board.rsi.sell);
        assert!(!board.rsi.buy);
        assert!(board.obv.buy);
        // Each bar gains 2.0 against a filter of 1.6 => up-trend.
        assert!(board.range_filter.buy);
    }

    #[test]
    fn steady_decline_flags_oversold() {
        let closes: Vec<f64> = (0..80).map(|i| 500.0 - i as f64 * 2.0).collect();
        let board = SignalBoard::evaluate(&series_from_closes(&closes), &IndicatorParams::default());
        assert!(board.rsi.buy);
        assert!(board.obv.sell);
        assert!(board.range_filter.sell);
        assert!(board.sell_count() >= 2);
    }

    #[test]
    fn flags_never_both_set() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let board = SignalBoard::evaluate(&series_from_closes(&closes), &IndicatorParams::default());
        for p in board.pairs() {
            assert!(!(p.buy && p.sell));
        }
    }
}
