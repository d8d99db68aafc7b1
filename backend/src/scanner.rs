// =============================================================================
// Scanner: periodic analysis of every watched symbol
// =============================================================================
//
// Every `scan_interval_secs` the scanner fetches and analyzes each configured
// symbol, caches the result and journals it. With `market_hours_only` set it
// idles outside the Indian cash session.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::analysis::{analyze_symbol, Analysis, NoAnalysis};
use crate::app_state::AppState;
use crate::market_hours::is_market_open;
use crate::runtime_config::{ScannerSettings, SymbolEntry};

/// Analyze one symbol with the current analyzer and record the outcome.
///
/// Successful analyses are cached and journaled; fetch failures land in the
/// error log.
pub async fn analyze_and_record(state: &Arc<AppState>, entry: &SymbolEntry) -> Result<Analysis, NoAnalysis> {
    let (period, interval) = {
        let config = state.config.read();
        (config.period.clone(), config.interval.clone())
    };

    let outcome = analyze_symbol(
        state.analyzer(),
        &state.fetcher,
        &entry.name,
        &entry.ticker,
        &period,
        &interval,
    )
    .await;

    match &outcome {
        Ok(analysis) => state.record_analysis(&entry.name, analysis),
        Err(NoAnalysis::FetchFailed(reason)) => {
            state.push_error(format!("fetch failed: {reason}"), Some(&entry.name));
        }
        Err(NoAnalysis::WorkerFailed(reason)) => {
            state.push_error(format!("analysis failed: {reason}"), Some(&entry.name));
        }
        Err(NoAnalysis::NoData) => {}
    }
    outcome
}

/// Analyze every configured symbol concurrently. Returns how many produced a
/// result.
pub async fn scan_once(state: &Arc<AppState>) -> usize {
    let symbols = state.config.read().symbols.clone();
    let outcomes = join_all(symbols.iter().map(|entry| analyze_and_record(state, entry))).await;
    let analysed = outcomes.iter().filter(|o| o.is_ok()).count();

    *state.last_scan_at.write() = Some(Utc::now().to_rfc3339());
    state.increment_version();
    info!(symbols = symbols.len(), analysed, "scan complete");
    analysed
}

/// Whether a scan should run at `now`.
pub fn should_scan(settings: &ScannerSettings, now: DateTime<Utc>) -> bool {
    settings.enabled && (!settings.market_hours_only || is_market_open(now))
}

/// Scanner loop. Runs until the task is aborted.
pub async fn run_scanner(state: Arc<AppState>) {
    let every = state.config.read().scanner.scan_interval_secs.max(1);
    let mut ticker = interval(Duration::from_secs(every));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = every, "scanner starting");

    loop {
        ticker.tick().await;
        let settings = state.config.read().scanner.clone();
        if !should_scan(&settings, Utc::now()) {
            debug!("market closed, scan skipped");
            continue;
        }
        scan_once(&state).await;
    }
}
