// =============================================================================
// Index Signal Advisor: Main Entry Point
// =============================================================================
//
// Loads configuration, assembles the provider chain and the classifier
// handle, warms the classifier up, then runs the scanner and the HTTP API
// until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod decision;
mod indicators;
mod journal;
mod market_data;
mod market_hours;
mod runtime_config;
mod scanner;
mod signals;
mod targets;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::decision::ClassifierHandle;
use crate::journal::Journal;
use crate::market_data::{FallbackFetcher, SeriesProvider, SyntheticProvider, YahooChartClient};
use crate::runtime_config::{api_token_from_env, AdvisorConfig, ProviderKind, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Index Signal Advisor: Starting Up                 ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path = PathBuf::from(
        std::env::var("ADVISOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    );
    let mut config = AdvisorConfig::load_or_default(&config_path);
    config.apply_env();

    info!(symbols = ?config.symbol_names(), "watched instruments");
    info!(
        period = %config.period,
        interval = %config.interval,
        scan_interval_secs = config.scanner.scan_interval_secs,
        market_hours_only = config.scanner.market_hours_only,
        "advisor configuration"
    );

    let api_token = api_token_from_env();
    if api_token.is_none() {
        warn!("ADVISOR_API_TOKEN not set; journal, thresholds and WebSocket routes are disabled");
    }

    // ── 2. Ingestion chain ───────────────────────────────────────────────
    let fetcher = build_fetcher(&config)?;
    info!(providers = ?fetcher.provider_names(), "data providers ready");

    // ── 3. Classifier (lazy, warmed up off the async runtime) ────────────
    let classifier = Arc::new(ClassifierHandle::from_path(&config.model_path));
    {
        let handle = classifier.clone();
        match tokio::task::spawn_blocking(move || handle.get().is_some()).await {
            Ok(true) => {}
            Ok(false) => warn!(path = %config.model_path, "classifier not loaded; decisions use the rule fallback"),
            Err(e) => error!(error = %e, "classifier warm-up task failed"),
        }
    }

    // ── 4. Journal ───────────────────────────────────────────────────────
    let journal = match &config.journal.path {
        Some(path) => Journal::open(path, config.journal.capacity).unwrap_or_else(|e| {
            error!(error = %format!("{e:#}"), "journal file unusable; keeping records in memory");
            Journal::in_memory(config.journal.capacity)
        }),
        None => Journal::in_memory(config.journal.capacity),
    };

    let bind_addr = config.bind_addr.clone();
    let scanner_enabled = config.scanner.enabled;
    let state = Arc::new(AppState::new(
        config,
        Some(config_path.clone()),
        classifier,
        fetcher,
        journal,
        api_token,
    ));

    // ── 5. Scanner ───────────────────────────────────────────────────────
    if scanner_enabled {
        tokio::spawn(scanner::run_scanner(state.clone()));
    } else {
        info!("scanner disabled");
    }

    // ── 6. API server ────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 7. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping");

    let snapshot = state.config.read().clone();
    if let Err(e) = snapshot.save(&config_path) {
        error!(error = %format!("{e:#}"), "failed to save advisor config on shutdown");
    }

    info!("Index Signal Advisor shut down complete.");
    Ok(())
}

/// Providers in configured order, with the synthetic generator last when
/// the fallback is enabled.
fn build_fetcher(config: &AdvisorConfig) -> anyhow::Result<FallbackFetcher> {
    let mut providers: Vec<Arc<dyn SeriesProvider>> = Vec::new();
    for kind in &config.providers {
        match kind {
            ProviderKind::Yahoo => providers.push(Arc::new(YahooChartClient::new()?)),
            ProviderKind::Synthetic => providers.push(Arc::new(SyntheticProvider::new(config.synthetic_seed))),
        }
    }
    if config.synthetic_fallback && !config.providers.contains(&ProviderKind::Synthetic) {
        providers.push(Arc::new(SyntheticProvider::new(config.synthetic_seed)));
    }
    if providers.is_empty() {
        anyhow::bail!("no data providers configured");
    }
    Ok(FallbackFetcher::new(providers))
}
