// =============================================================================
// Analysis pipeline: series -> indicators -> decision -> targets -> result
// =============================================================================
//
// `Analyzer::analyze_series` is the synchronous core: pure apart from the
// classifier handle it consults. `analyze_symbol` wraps it with ingestion and
// runs the computation on a blocking worker so async handlers stay
// responsive.
// =============================================================================

pub mod narrative;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::decision::{ClassifierHandle, Decision, DecisionEngine, DecisionParams, FeatureVector, TrendStrength};
use crate::indicators::{IndicatorParams, IndicatorSnapshot};
use crate::market_data::{FallbackFetcher, FetchOutcome, PriceBar, PriceSeries};
use crate::targets::{compute_targets, option_targets, OptionTargets, TargetInputs, TargetParams};

/// Flat result served to the dashboard and API clients. Field names are part
/// of the public contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub price: f64,
    /// "BUY", "SELL" or "HOLD".
    pub action: String,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub reason: String,
    pub rsi: Option<f64>,
    pub phase: String,
    pub hold_time: String,
    pub hold_range: String,
    pub confidence: f64,
    /// Raw 0–4 trend counter.
    pub trend_strength: u8,
    pub volatility: Option<f64>,
    pub adx: Option<f64>,
    pub option_targets: OptionTargets,
}

impl AnalysisResult {
    /// Replace any non-finite optional number with null.
    fn sanitized(mut self) -> Self {
        let clean = |v: Option<f64>| v.filter(|x| x.is_finite());
        self.stop_loss = clean(self.stop_loss);
        self.take_profit = clean(self.take_profit);
        self.rsi = clean(self.rsi);
        self.volatility = clean(self.volatility);
        self.adx = clean(self.adx);
        if !self.confidence.is_finite() {
            self.confidence = 0.0;
        }
        self
    }
}

/// Everything one analysis produced, for the journal and the API.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// The bar the analysis ended on.
    pub bar: PriceBar,
    pub result: AnalysisResult,
    pub snapshot: IndicatorSnapshot,
    pub decision: Decision,
    pub features: FeatureVector,
}

#[derive(Clone)]
pub struct Analyzer {
    engine: DecisionEngine,
    indicators: IndicatorParams,
    targets: TargetParams,
}

impl Analyzer {
    pub fn new(
        classifier: Arc<ClassifierHandle>,
        indicators: IndicatorParams,
        decision: DecisionParams,
        targets: TargetParams,
    ) -> Self {
        Self {
            engine: DecisionEngine::new(classifier, decision),
            indicators,
            targets,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Run the full pipeline over one series.
    ///
    /// Returns `None` for an empty series; never fails otherwise.
    pub fn analyze_series(&self, symbol: &str, series: &PriceSeries) -> Option<Analysis> {
        let bar = *series.last()?;
        let price = bar.close;
        if series.len() < self.indicators.warm_up_bars() {
            debug!(symbol, bars = series.len(), "series shorter than indicator warm-up");
        }

        let snapshot = IndicatorSnapshot::compute(series, &self.indicators);
        let trend = TrendStrength::evaluate(&snapshot, self.engine.params().adx_trend_threshold);
        let features = FeatureVector::from_snapshot(&snapshot, trend.normalized());
        let decision = self.engine.decide(&features);

        let targets = compute_targets(
            &TargetInputs {
                price,
                action: decision.action,
                atr: snapshot.atr,
                volatility: features.volatility,
                trend_strength_raw: trend.raw(),
            },
            &self.targets,
        );

        let phase = narrative::classify_phase(&snapshot, trend.raw());
        let volume_trend = snapshot.volume_trend.unwrap_or(1.0);

        let result = AnalysisResult {
            symbol: symbol.to_string(),
            price,
            action: decision.action.as_upper().to_string(),
            stop_loss: targets.stop_loss,
            take_profit: targets.take_profit,
            reason: narrative::reason(decision.action, features.rsi, features.macd, trend.raw(), volume_trend),
            rsi: snapshot.rsi,
            phase: phase.to_string(),
            hold_time: narrative::hold_time(phase, price),
            hold_range: narrative::hold_range(price, snapshot.recent_high, snapshot.recent_low),
            confidence: decision.confidence,
            trend_strength: trend.raw(),
            volatility: snapshot.volatility,
            adx: snapshot.adx,
            option_targets: option_targets(price, decision.action, features.volatility),
        }
        .sanitized();

        debug!(
            symbol,
            bars = series.len(),
            action = %result.action,
            confidence = result.confidence,
            phase = %result.phase,
            "analysis complete"
        );

        Some(Analysis {
            bar,
            result,
            snapshot,
            decision,
            features,
        })
    }
}

/// Why an analysis produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoAnalysis {
    /// Providers answered without data.
    NoData,
    /// Every provider failed; carries the last reason.
    FetchFailed(String),
    /// The blocking worker panicked or was cancelled.
    WorkerFailed(String),
}

/// Fetch `ticker` and analyze it on a blocking worker.
pub async fn analyze_symbol(
    analyzer: Arc<Analyzer>,
    fetcher: &FallbackFetcher,
    name: &str,
    ticker: &str,
    period: &str,
    interval: &str,
) -> Result<Analysis, NoAnalysis> {
    let series = match fetcher.fetch(ticker, period, interval).await {
        FetchOutcome::Data(series) => series,
        FetchOutcome::Empty => {
            info!(symbol = %name, ticker, "no data available");
            return Err(NoAnalysis::NoData);
        }
        FetchOutcome::Failed(reason) => {
            warn!(symbol = %name, ticker, reason = %reason, "fetch failed");
            return Err(NoAnalysis::FetchFailed(reason));
        }
    };

    let symbol = name.to_string();
    let joined = tokio::task::spawn_blocking(move || analyzer.analyze_series(&symbol, &series)).await;

    match joined {
        Ok(Some(analysis)) => Ok(analysis),
        Ok(None) => Err(NoAnalysis::NoData),
        Err(e) => {
            error!(symbol = %name, error = %e, "analysis worker failed");
            Err(NoAnalysis::WorkerFailed(e.to_string()))
        }
    }
}
