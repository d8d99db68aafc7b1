// =============================================================================
// Signals Module
// =============================================================================
//
// Secondary read-outs served next to the main analysis:
// - Signal board (per-indicator buy/sell flags)
// - Market stage (accumulation / advancing / distribution / declining)

pub mod board;
pub mod stage;

use serde::Serialize;

use crate::indicators::IndicatorParams;
use crate::market_data::PriceSeries;

pub use board::SignalBoard;
pub use stage::MarketStage;

/// Board and stage for one symbol, as served by `/signals/{symbol}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub symbol: String,
    pub signals: SignalBoard,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub stage: MarketStage,
}

impl SignalReport {
    pub fn build(symbol: &str, series: &PriceSeries, params: &IndicatorParams) -> Self {
        let signals = SignalBoard::evaluate(series, params);
        Self {
            symbol: symbol.to_string(),
            buy_signals: signals.buy_count(),
            sell_signals: signals.sell_count(),
            signals,
            stage: MarketStage::identify(series),
        }
    }
}
