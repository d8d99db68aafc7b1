// =============================================================================
// Feature vector: fixed-shape classifier input
// =============================================================================
//
// The field order below is the order the classifier artifact declares; it is
// checked when the artifact loads. Any input the indicator bank could not
// define is filled from the default table in `PartialFeatures::resolve`.
// =============================================================================

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// Feature names in classifier order.
pub const FEATURE_NAMES: [&str; 19] = [
    "rsi",
    "macd",
    "macd_signal",
    "sma",
    "ema",
    "volume",
    "bb_upper",
    "bb_lower",
    "bb_middle",
    "stoch_k",
    "stoch_d",
    "adx",
    "cci",
    "williams_r",
    "mfi",
    "roc",
    "volatility",
    "trend_strength",
    "momentum",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub sma: f64,
    pub ema: f64,
    pub volume: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub bb_middle: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub adx: f64,
    pub cci: f64,
    pub williams_r: f64,
    pub mfi: f64,
    pub roc: f64,
    pub volatility: f64,
    pub trend_strength: f64,
    pub momentum: f64,
}

/// Partially known inputs; `None` takes the default.
#[derive(Debug, Clone, Default)]
struct PartialFeatures {
    values: [Option<f64>; 19],
}

impl PartialFeatures {
    fn set(&mut self, name: &str, value: Option<f64>) {
        if let Some(i) = FEATURE_NAMES.iter().position(|n| *n == name) {
            self.values[i] = value.filter(|v| v.is_finite());
        }
    }

    fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values[i])
    }

    /// Apply the default table; returns the vector and the names that were
    /// defaulted, in feature order.
    fn resolve(&self, close: f64) -> (FeatureVector, Vec<&'static str>) {
        let mut defaulted = Vec::new();
        let mut take = |name: &'static str, default: f64| match self.get(name) {
            Some(v) => v,
            None => {
                defaulted.push(name);
                default
            }
        };

        let rsi = take("rsi", 50.0);
        let macd = take("macd", 0.0);
        let macd_signal = take("macd_signal", macd * 0.8);
        let sma = take("sma", close);
        let ema = take("ema", close);
        let volume = take("volume", 0.0);
        let bb_upper = take("bb_upper", close);
        let bb_lower = take("bb_lower", close);
        let bb_middle = take("bb_middle", (bb_upper + bb_lower) / 2.0);
        let stoch_k = take("stoch_k", 50.0);
        let stoch_d = take("stoch_d", 50.0);
        let adx = take("adx", 25.0);
        let cci = take("cci", 0.0);
        let williams_r = take("williams_r", -50.0);
        let mfi = take("mfi", 50.0);
        let roc = take("roc", 0.0);
        let volatility = take("volatility", 2.0);
        let trend_strength = take("trend_strength", 0.5);
        let momentum = take("momentum", macd);

        let fv = FeatureVector {
            rsi,
            macd,
            macd_signal,
            sma,
            ema,
            volume,
            bb_upper,
            bb_lower,
            bb_middle,
            stoch_k,
            stoch_d,
            adx,
            cci,
            williams_r,
            mfi,
            roc,
            volatility,
            trend_strength,
            momentum,
        };
        (fv, defaulted)
    }
}

impl FeatureVector {
    /// Build from an indicator snapshot and the normalized trend strength.
    /// `momentum` mirrors the MACD value.
    pub fn from_snapshot(snapshot: &IndicatorSnapshot, trend_strength: f64) -> Self {
        let mut partial = PartialFeatures::default();
        partial.set("rsi", snapshot.rsi);
        partial.set("macd", snapshot.macd);
        partial.set("macd_signal", snapshot.macd_signal);
        partial.set("sma", snapshot.sma_20);
        partial.set("ema", snapshot.ema_20);
        partial.set("volume", snapshot.avg_volume);
        partial.set("bb_upper", snapshot.bb_upper);
        partial.set("bb_lower", snapshot.bb_lower);
        partial.set("bb_middle", snapshot.bb_middle);
        partial.set("stoch_k", snapshot.stoch_k);
        partial.set("stoch_d", snapshot.stoch_d);
        partial.set("adx", snapshot.adx);
        partial.set("cci", snapshot.cci);
        partial.set("williams_r", snapshot.williams_r);
        partial.set("mfi", snapshot.mfi);
        partial.set("roc", snapshot.roc);
        partial.set("volatility", snapshot.volatility);
        partial.set("trend_strength", Some(trend_strength));
        partial.set("momentum", snapshot.macd);
        partial.resolve(snapshot.close.unwrap_or(0.0)).0
    }

    /// Build from a named map such as a `/predict` request body.
    ///
    /// Unknown keys are rejected, naming every offender. Missing keys take the
    /// default table, where "latest close" is `close` (0 when not given).
    /// Returns the vector and the list of defaulted feature names.
    pub fn from_named(
        values: &HashMap<String, f64>,
        close: Option<f64>,
    ) -> Result<(Self, Vec<&'static str>)> {
        let mut unknown: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|k| !FEATURE_NAMES.contains(k))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            anyhow::bail!("unknown feature(s): {}", unknown.join(", "));
        }
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            anyhow::bail!("feature '{}' is not a finite number", name);
        }

        let mut partial = PartialFeatures::default();
        for (name, value) in values {
            partial.set(name, Some(*value));
        }
        Ok(partial.resolve(close.filter(|c| c.is_finite()).unwrap_or(0.0)))
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; 19] {
        [
            self.rsi,
            self.macd,
            self.macd_signal,
            self.sma,
            self.ema,
            self.volume,
            self.bb_upper,
            self.bb_lower,
            self.bb_middle,
            self.stoch_k,
            self.stoch_d,
            self.adx,
            self.cci,
            self.williams_r,
            self.mfi,
            self.roc,
            self.volatility,
            self.trend_strength,
            self.momentum,
        ]
    }
}
