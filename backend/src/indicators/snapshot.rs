// =============================================================================
// Indicator snapshot: latest value of every indicator for one series
// =============================================================================

use serde::{Deserialize, Serialize};

use super::{
    adx::calculate_adx, atr::calculate_atr, bollinger::calculate_bollinger, cci::calculate_cci,
    ema::calculate_ema, finite, latest, macd::calculate_macd, mfi::calculate_mfi,
    roc::calculate_roc, rsi::calculate_rsi, sma::calculate_sma, stochastic::calculate_stochastic,
    volatility::{return_volatility, volume_trend}, williams_r::calculate_williams_r,
};
use crate::market_data::PriceSeries;

/// Indicator windows and multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_period: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub adx_period: usize,
    pub cci_period: usize,
    pub williams_period: usize,
    pub mfi_period: usize,
    pub roc_period: usize,
    pub atr_period: usize,
    pub volume_short: usize,
    pub volume_long: usize,
    /// Bars considered for `recent_high` / `recent_low`.
    pub recent_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std: 2.0,
            sma_short: 20,
            sma_long: 50,
            ema_period: 20,
            stoch_k: 14,
            stoch_d: 3,
            adx_period: 14,
            cci_period: 14,
            williams_period: 14,
            mfi_period: 14,
            roc_period: 14,
            atr_period: 14,
            volume_short: 5,
            volume_long: 20,
            recent_window: 20,
        }
    }
}

impl IndicatorParams {
    /// Longest look-back any indicator needs before its tail is defined.
    pub fn warm_up_bars(&self) -> usize {
        [
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal,
            self.bb_period,
            self.sma_long,
            self.ema_period,
            self.stoch_k + self.stoch_d,
            2 * self.adx_period + 1,
            self.cci_period,
            self.williams_period,
            self.mfi_period + 1,
            self.roc_period + 1,
            self.atr_period + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Latest value per indicator; `None` means undefined for this series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_20: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub adx: Option<f64>,
    pub cci: Option<f64>,
    pub williams_r: Option<f64>,
    pub mfi: Option<f64>,
    pub roc: Option<f64>,
    pub atr: Option<f64>,
    pub volatility: Option<f64>,
    pub volume_trend: Option<f64>,
    pub avg_volume: Option<f64>,
    pub close: Option<f64>,
    pub recent_high: Option<f64>,
    pub recent_low: Option<f64>,
}

impl IndicatorSnapshot {
    /// Compute every indicator over `series` and keep the tail values.
    /// An empty series yields an all-undefined snapshot.
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> Self {
        if series.is_empty() {
            return Self::default();
        }

        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();

        let macd = calculate_macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
        let bb = calculate_bollinger(&closes, params.bb_period, params.bb_std);
        let stoch = calculate_stochastic(&highs, &lows, &closes, params.stoch_k, params.stoch_d);

        let window = params.recent_window.clamp(1, closes.len());
        let recent_high = highs[highs.len() - window..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let recent_low = lows[lows.len() - window..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);

        Self {
            rsi: latest(&calculate_rsi(&closes, params.rsi_period)),
            macd: latest(&macd.macd),
            macd_signal: latest(&macd.signal),
            macd_histogram: latest(&macd.histogram),
            sma_20: latest(&calculate_sma(&closes, params.sma_short)),
            sma_50: latest(&calculate_sma(&closes, params.sma_long)),
            ema_20: latest(&calculate_ema(&closes, params.ema_period)),
            bb_upper: latest(&bb.upper),
            bb_middle: latest(&bb.middle),
            bb_lower: latest(&bb.lower),
            stoch_k: latest(&stoch.k),
            stoch_d: latest(&stoch.d),
            adx: latest(&calculate_adx(&highs, &lows, &closes, params.adx_period)),
            cci: latest(&calculate_cci(&highs, &lows, &closes, params.cci_period)),
            williams_r: latest(&calculate_williams_r(&highs, &lows, &closes, params.williams_period)),
            mfi: latest(&calculate_mfi(&highs, &lows, &closes, &volumes, params.mfi_period)),
            roc: latest(&calculate_roc(&closes, params.roc_period)),
            atr: latest(&calculate_atr(&highs, &lows, &closes, params.atr_period)),
            volatility: return_volatility(&closes),
            volume_trend: finite(volume_trend(&volumes, params.volume_short, params.volume_long)),
            avg_volume: finite(volumes.iter().sum::<f64>() / volumes.len() as f64),
            close: series.last().map(|b| b.close),
            recent_high: finite(recent_high),
            recent_low: finite(recent_low),
        }
    }
}
