// =============================================================================
// Target calculator: ATR-multiple stop-loss / take-profit
// =============================================================================
//
//   risk_multiplier = 1.5 if volatility > 2.0 else 2.0
//   buy : SL = price - ATR * risk_multiplier
//         TP = price + ATR * 4.0   (raw trend >= 3)
//         TP = price + ATR * 2.5   (otherwise)
//   sell: mirror image
//   hold: no levels
//
// A missing or non-positive ATR is replaced by 0.5 % of price so levels never
// collapse onto the price. Pure and deterministic.
// =============================================================================

pub mod options;

use serde::{Deserialize, Serialize};

use crate::types::Action;

pub use options::{option_targets, OptionTargets};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    /// Volatility (percent) above which the tighter stop applies.
    pub volatility_threshold: f64,
    pub calm_risk_multiplier: f64,
    pub volatile_risk_multiplier: f64,
    /// Raw trend count at or above which the wide target applies.
    pub strong_trend_min: u8,
    pub strong_trend_target_atr: f64,
    pub normal_target_atr: f64,
    /// ATR substitute as a fraction of price.
    pub atr_fallback_fraction: f64,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            volatility_threshold: 2.0,
            calm_risk_multiplier: 2.0,
            volatile_risk_multiplier: 1.5,
            strong_trend_min: 3,
            strong_trend_target_atr: 4.0,
            normal_target_atr: 2.5,
            atr_fallback_fraction: 0.005,
        }
    }
}

impl TargetParams {
    /// Stop distance in ATRs for the given volatility.
    pub fn risk_multiplier(&self, volatility: f64) -> f64 {
        if volatility > self.volatility_threshold {
            self.volatile_risk_multiplier
        } else {
            self.calm_risk_multiplier
        }
    }

    /// ATR, or the price-based substitute when it is missing or not positive.
    pub fn effective_atr(&self, atr: Option<f64>, price: f64) -> f64 {
        match atr {
            Some(a) if a.is_finite() && a > 0.0 => a,
            _ => price.abs() * self.atr_fallback_fraction,
        }
    }
}

/// Inputs to the calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInputs {
    pub price: f64,
    pub action: Action,
    pub atr: Option<f64>,
    /// Percent return volatility.
    pub volatility: f64,
    pub trend_strength_raw: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TargetSet {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

pub fn compute_targets(inputs: &TargetInputs, params: &TargetParams) -> TargetSet {
    let atr = params.effective_atr(inputs.atr, inputs.price);
    let risk = params.risk_multiplier(inputs.volatility);
    let reward = if inputs.trend_strength_raw >= params.strong_trend_min {
        params.strong_trend_target_atr
    } else {
        params.normal_target_atr
    };

    let direction = match inputs.action {
        Action::Buy => 1.0,
        Action::Sell => -1.0,
        Action::Hold => return TargetSet::default(),
    };

    TargetSet {
        stop_loss: Some(inputs.price - direction * atr * risk),
        take_profit: Some(inputs.price + direction * atr * reward),
    }
}
