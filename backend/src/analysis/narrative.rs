// =============================================================================
// Narrative: market phase, holding horizon, holding range, reason sentence
// =============================================================================
//
// Phases are checked in order; the first match wins:
//
//   Strong Bullish    rsi < 30, macd > signal, raw trend >= 2
//   Bullish Recovery  rsi < 35, macd > signal or close > sma20
//   Strong Bearish    rsi > 70, macd < signal, raw trend >= 2
//   Bearish Setup     rsi > 65, macd < signal or close < sma20
//   Consolidation     40 <= rsi <= 60, |macd - signal| < 0.5 * ATR
//   Neutral           otherwise
//
// An undefined operand fails its comparison, so a series too short for RSI
// always reads Neutral.
// =============================================================================

use serde::Serialize;

use crate::indicators::IndicatorSnapshot;
use crate::types::Action;

const RANGE_FRACTION: f64 = 0.02;
const LEVEL_GRID: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketPhase {
    #[serde(rename = "Strong Bullish")]
    StrongBullish,
    #[serde(rename = "Bullish Recovery")]
    BullishRecovery,
    #[serde(rename = "Strong Bearish")]
    StrongBearish,
    #[serde(rename = "Bearish Setup")]
    BearishSetup,
    Consolidation,
    Neutral,
}

impl MarketPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBullish => "Strong Bullish",
            Self::BullishRecovery => "Bullish Recovery",
            Self::StrongBearish => "Strong Bearish",
            Self::BearishSetup => "Bearish Setup",
            Self::Consolidation => "Consolidation",
            Self::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

fn lt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

pub fn classify_phase(snapshot: &IndicatorSnapshot, trend_raw: u8) -> MarketPhase {
    let rsi = snapshot.rsi;
    let bullish_macd = gt(snapshot.macd, snapshot.macd_signal);
    let bearish_macd = lt(snapshot.macd, snapshot.macd_signal);

    if lt(rsi, Some(30.0)) && bullish_macd && trend_raw >= 2 {
        MarketPhase::StrongBullish
    } else if lt(rsi, Some(35.0)) && (bullish_macd || gt(snapshot.close, snapshot.sma_20)) {
        MarketPhase::BullishRecovery
    } else if gt(rsi, Some(70.0)) && bearish_macd && trend_raw >= 2 {
        MarketPhase::StrongBearish
    } else if gt(rsi, Some(65.0)) && (bearish_macd || lt(snapshot.close, snapshot.sma_20)) {
        MarketPhase::BearishSetup
    } else if rsi.is_some_and(|r| (40.0..=60.0).contains(&r)) && is_flat_macd(snapshot) {
        MarketPhase::Consolidation
    } else {
        MarketPhase::Neutral
    }
}

fn is_flat_macd(snapshot: &IndicatorSnapshot) -> bool {
    match (snapshot.macd, snapshot.macd_signal, snapshot.atr) {
        (Some(m), Some(s), Some(atr)) => (m - s).abs() < atr * 0.5,
        _ => false,
    }
}

/// Nearest multiple of 50, ties to even.
fn grid_level(v: f64) -> f64 {
    (v / LEVEL_GRID).round_ties_even() * LEVEL_GRID
}

/// Suggested holding horizon with a concrete price target or levels.
pub fn hold_time(phase: MarketPhase, price: f64) -> String {
    match phase {
        MarketPhase::StrongBullish => format!("Intraday to 2 days (Target: ₹{:.0})", price + 300.0),
        MarketPhase::BullishRecovery => format!("Intraday to 1 day (Target: ₹{:.0})", price + 200.0),
        MarketPhase::StrongBearish => format!("Intraday to 2 days (Target: ₹{:.0})", price - 300.0),
        MarketPhase::BearishSetup => format!("Intraday to 1 day (Target: ₹{:.0})", price - 200.0),
        MarketPhase::Consolidation => format!(
            "Wait for breakout - Buy above ₹{:.0} or Sell below ₹{:.0}",
            grid_level(price + 100.0),
            grid_level(price - 100.0)
        ),
        MarketPhase::Neutral => format!(
            "Monitor key levels - Resistance: ₹{:.0}, Support: ₹{:.0}",
            grid_level(price + 150.0),
            grid_level(price - 150.0)
        ),
    }
}

/// The tighter of ±2 % around price and the recent high/low.
pub fn hold_range(price: f64, recent_high: Option<f64>, recent_low: Option<f64>) -> String {
    let mut low = price * (1.0 - RANGE_FRACTION);
    let mut high = price * (1.0 + RANGE_FRACTION);
    if let Some(rl) = recent_low {
        low = low.max(rl);
    }
    if let Some(rh) = recent_high {
        high = high.min(rh);
    }
    format!("₹{:.0} - ₹{:.0}", low, high)
}

/// One-sentence justification quoting the values that drove the decision.
pub fn reason(action: Action, rsi: f64, macd: f64, trend_raw: u8, volume_trend: f64) -> String {
    match action {
        Action::Buy => format!(
            "Strong buy signal: RSI {:.1} (oversold), MACD bullish (↑{:.2}), Trend strength {}/4, Volume {:.1}x avg",
            rsi, macd, trend_raw, volume_trend
        ),
        Action::Sell => format!(
            "Strong sell signal: RSI {:.1} (overbought), MACD bearish (↓{:.2}), Trend weakness {}/4, Volume {:.1}x avg",
            rsi,
            macd,
            4u8.saturating_sub(trend_raw),
            volume_trend
        ),
        Action::Hold => format!(
            "Hold position: Market equilibrium, RSI {:.1} (neutral), MACD flat, waiting for directional momentum",
            rsi
        ),
    }
}
