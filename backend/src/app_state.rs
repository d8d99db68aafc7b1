// =============================================================================
// Central Application State: Index Signal Advisor
// =============================================================================
//
// Ties together the configuration, the shared analyzer, the ingestion chain,
// the journal and the latest scanner results, and builds the snapshot pushed
// to dashboard clients.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
//   - The analyzer is swapped as a whole (`Arc`) when thresholds change, so
//     an analysis in flight keeps the parameters it started with.
// =============================================================================

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{Analysis, AnalysisResult, Analyzer};
use crate::decision::{ClassifierHandle, ClassifierStatus, DecisionParams};
use crate::journal::{Journal, TradingRecord};
use crate::market_data::FallbackFetcher;
use crate::market_hours::is_market_open;
use crate::runtime_config::AdvisorConfig;
use crate::targets::TargetParams;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// Symbol the error relates to, when there is one.
    pub symbol: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Cached output of the most recent analysis of a symbol.
#[derive(Debug, Clone, Serialize)]
pub struct LatestResult {
    pub result: AnalysisResult,
    pub updated_at: String,
}

/// Runtime-adjustable decision and target thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub decision: DecisionParams,
    #[serde(default)]
    pub targets: TargetParams,
}

impl Thresholds {
    /// Reject values that would break the decision or target invariants.
    pub fn validate(&self) -> Result<()> {
        let d = &self.decision;
        let t = &self.targets;
        let all_finite = [
            d.confidence_threshold,
            d.adx_trend_threshold,
            d.rsi_oversold,
            d.rsi_overbought,
            d.fallback_confidence,
            t.volatility_threshold,
            t.calm_risk_multiplier,
            t.volatile_risk_multiplier,
            t.strong_trend_target_atr,
            t.normal_target_atr,
            t.atr_fallback_fraction,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            bail!("thresholds must be finite numbers");
        }
        if !(0.0..=1.0).contains(&d.confidence_threshold) || !(0.0..=1.0).contains(&d.fallback_confidence) {
            bail!("confidence values must lie in [0, 1]");
        }
        if !(0.0..=100.0).contains(&d.rsi_oversold)
            || !(0.0..=100.0).contains(&d.rsi_overbought)
            || d.rsi_oversold >= d.rsi_overbought
        {
            bail!("rsi_oversold must be below rsi_overbought, both within [0, 100]");
        }
        let multipliers = [
            t.calm_risk_multiplier,
            t.volatile_risk_multiplier,
            t.strong_trend_target_atr,
            t.normal_target_atr,
            t.atr_fallback_fraction,
        ];
        if multipliers.iter().any(|&m| m <= 0.0) {
            bail!("ATR multipliers and the ATR fallback fraction must be positive");
        }
        Ok(())
    }
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful mutation so WebSocket clients know to refresh.
    pub state_version: AtomicU64,

    /// Global count of WebSocket messages sent.
    pub ws_sequence_number: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub config: RwLock<AdvisorConfig>,
    /// Where threshold updates are persisted; `None` keeps them in memory.
    config_path: Option<PathBuf>,
    api_token: Option<String>,

    // ── Pipeline ────────────────────────────────────────────────────────
    analyzer: RwLock<Arc<Analyzer>>,
    pub classifier: Arc<ClassifierHandle>,
    pub fetcher: FallbackFetcher,

    // ── Outputs ─────────────────────────────────────────────────────────
    pub journal: Journal,
    latest: RwLock<HashMap<String, LatestResult>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,
    pub last_scan_at: RwLock<Option<String>>,
}

impl AppState {
    pub fn new(
        config: AdvisorConfig,
        config_path: Option<PathBuf>,
        classifier: Arc<ClassifierHandle>,
        fetcher: FallbackFetcher,
        journal: Journal,
        api_token: Option<String>,
    ) -> Self {
        let analyzer = Analyzer::new(
            classifier.clone(),
            config.indicators.clone(),
            config.decision.clone(),
            config.targets.clone(),
        );
        Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            config: RwLock::new(config),
            config_path,
            api_token,
            analyzer: RwLock::new(Arc::new(analyzer)),
            classifier,
            fetcher,
            journal,
            latest: RwLock::new(HashMap::new()),
            recent_errors: RwLock::new(Vec::new()),
            last_scan_at: RwLock::new(None),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Access ──────────────────────────────────────────────────────────

    /// The analyzer built from the current thresholds.
    pub fn analyzer(&self) -> Arc<Analyzer> {
        self.analyzer.read().clone()
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn thresholds(&self) -> Thresholds {
        let config = self.config.read();
        Thresholds {
            decision: config.decision.clone(),
            targets: config.targets.clone(),
        }
    }

    /// Validate and apply new thresholds, rebuild the analyzer and persist
    /// the configuration.
    ///
    /// The new values are live even when persisting fails; the error is
    /// returned so the caller can report it.
    pub fn update_thresholds(&self, thresholds: Thresholds) -> Result<()> {
        thresholds.validate()?;

        let snapshot = {
            let mut config = self.config.write();
            config.decision = thresholds.decision;
            config.targets = thresholds.targets;
            *self.analyzer.write() = Arc::new(Analyzer::new(
                self.classifier.clone(),
                config.indicators.clone(),
                config.decision.clone(),
                config.targets.clone(),
            ));
            config.clone()
        };
        self.increment_version();
        info!(
            confidence_threshold = snapshot.decision.confidence_threshold,
            "thresholds updated"
        );

        match &self.config_path {
            Some(path) => snapshot.save(path),
            None => Ok(()),
        }
    }

    // ── Results ─────────────────────────────────────────────────────────

    /// Cache `analysis` as the latest result for `symbol` and journal it.
    pub fn record_analysis(&self, symbol: &str, analysis: &Analysis) {
        self.latest.write().insert(
            symbol.to_string(),
            LatestResult {
                result: analysis.result.clone(),
                updated_at: Utc::now().to_rfc3339(),
            },
        );

        if let Err(e) = self.journal.append(TradingRecord::new(symbol, analysis)) {
            warn!(symbol, error = %format!("{e:#}"), "journal append failed");
            self.push_error(format!("journal append failed: {e:#}"), Some(symbol));
        }

        self.increment_version();
    }

    /// Latest cached results in configured symbol order.
    pub fn latest_results(&self) -> Vec<LatestResult> {
        let names = self.config.read().symbol_names();
        let latest = self.latest.read();
        names.iter().filter_map(|n| latest.get(n).cloned()).collect()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. Oldest entries are evicted past
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, message: String, symbol: Option<&str>) {
        let record = ErrorRecord {
            message,
            symbol: symbol.map(str::to_string),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Serialisable view of the advisor, pushed over the WebSocket feed.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let now = Utc::now();
        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: now.timestamp_millis(),
            market_open: is_market_open(now),
            classifier: self.classifier.status(),
            providers: self.fetcher.provider_names(),
            last_scan_at: self.last_scan_at.read().clone(),
            results: self.latest_results(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

/// Full state snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub market_open: bool,
    pub classifier: ClassifierStatus,
    pub providers: Vec<&'static str>,
    pub last_scan_at: Option<String>,
    pub results: Vec<LatestResult>,
    pub recent_errors: Vec<ErrorRecord>,
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::market_data::synthetic::SyntheticProvider;
    use crate::market_data::SeriesProvider;
    use chrono::TimeZone;

    /// State over the synthetic provider with an in-memory journal.
    pub(crate) fn test_state(token: Option<&str>) -> Arc<AppState> {
        let providers: Vec<Arc<dyn SeriesProvider>> = vec![Arc::new(SyntheticProvider::default())];
        Arc::new(AppState::new(
            AdvisorConfig::default(),
            None,
            Arc::new(ClassifierHandle::unavailable("no model in tests")),
            FallbackFetcher::new(providers),
            Journal::in_memory(10),
            token.map(str::to_string),
        ))
    }

    fn analysis(state: &AppState, symbol: &str) -> Analysis {
        let anchor = Utc.with_ymd_and_hms(2024, 7, 10, 12, 0, 0).unwrap();
        let series = SyntheticProvider::default().generate("^NSEI", "5m", anchor);
        state.analyzer().analyze_series(symbol, &series).unwrap()
    }

    #[test]
    fn record_analysis_caches_journals_and_bumps_version() {
        let state = test_state(None);
        let before = state.current_state_version();
        state.record_analysis("Nifty50", &analysis(&state, "Nifty50"));
        assert!(state.current_state_version() > before);
        assert_eq!(state.journal.len(), 1);
        let latest = state.latest_results();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].result.symbol, "Nifty50");
    }

    #[test]
    fn latest_results_follow_config_order() {
        let state = test_state(None);
        for name in ["Nifty50", "Sensex", "Unlisted"] {
            state.record_analysis(name, &analysis(&state, name));
        }
        let order: Vec<String> = state.latest_results().iter().map(|l| l.result.symbol.clone()).collect();
        assert_eq!(order, vec!["Sensex", "Nifty50"]);
    }

    #[test]
    fn threshold_update_rebuilds_analyzer() {
        let state = test_state(None);
        let mut t = state.thresholds();
        t.decision.confidence_threshold = 0.75;
        state.update_thresholds(t).unwrap();
        assert_eq!(state.analyzer().engine().params().confidence_threshold, 0.75);
        assert_eq!(state.config.read().decision.confidence_threshold, 0.75);
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let state = test_state(None);
        let mut t = state.thresholds();
        t.decision.rsi_oversold = 80.0;
        assert!(state.update_thresholds(t).is_err());

        let mut t = state.thresholds();
        t.decision.confidence_threshold = 1.5;
        assert!(state.update_thresholds(t).is_err());

        let mut t = state.thresholds();
        t.targets.normal_target_atr = 0.0;
        assert!(state.update_thresholds(t).is_err());

        assert_eq!(state.thresholds(), test_state(None).thresholds());
    }

    #[test]
    fn error_log_is_bounded() {
        let state = test_state(None);
        for i in 0..(MAX_RECENT_ERRORS + 5) {
            state.push_error(format!("e{i}"), None);
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "e5");
    }

    #[test]
    fn snapshot_reports_classifier_and_providers() {
        let state = test_state(None);
        assert!(matches!(state.build_snapshot().classifier, ClassifierStatus::NotLoaded));
        assert!(state.classifier.get().is_none());
        let snap = state.build_snapshot();
        assert_eq!(snap.providers, vec!["synthetic"]);
        assert!(matches!(snap.classifier, ClassifierStatus::Unavailable { .. }));
    }
}
