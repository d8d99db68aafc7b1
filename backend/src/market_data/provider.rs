// =============================================================================
// Series providers: ingestion boundary
// =============================================================================
//
// Every provider answers `fetch(symbol, period, interval)` with an explicit
// outcome instead of raising: callers can tell "no data" apart from "the
// provider failed" without inspecting logs.
// =============================================================================

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::market_data::PriceSeries;

/// Result of a single fetch attempt.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// A non-empty, ordered series.
    Data(PriceSeries),
    /// The provider answered but had nothing for this window.
    Empty,
    /// The provider could not answer (network, HTTP status, parse error).
    Failed(String),
}

impl FetchOutcome {
    /// Wrap a series, mapping an empty series to [`FetchOutcome::Empty`].
    pub fn from_series(series: PriceSeries) -> Self {
        if series.is_empty() {
            Self::Empty
        } else {
            Self::Data(series)
        }
    }
}

/// Anything that can produce OHLCV bars for a symbol and window.
pub trait SeriesProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    fn fetch<'a>(
        &'a self,
        symbol: &'a str,
        period: &'a str,
        interval: &'a str,
    ) -> BoxFuture<'a, FetchOutcome>;
}

// =============================================================================
// FallbackFetcher
// =============================================================================

/// Tries each provider in order and returns the first non-empty series.
///
/// When every provider comes back empty the outcome is `Empty`; when at least
/// one failed the last failure reason is reported.
#[derive(Clone)]
pub struct FallbackFetcher {
    providers: Vec<Arc<dyn SeriesProvider>>,
}

impl FallbackFetcher {
    pub fn new(providers: Vec<Arc<dyn SeriesProvider>>) -> Self {
        Self { providers }
    }

    /// Names of the configured providers, in attempt order.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn fetch(&self, symbol: &str, period: &str, interval: &str) -> FetchOutcome {
        let mut last_failure: Option<String> = None;

        for provider in &self.providers {
            match provider.fetch(symbol, period, interval).await {
                FetchOutcome::Data(series) => {
                    debug!(
                        provider = provider.name(),
                        symbol,
                        bars = series.len(),
                        "series fetched"
                    );
                    return FetchOutcome::Data(series);
                }
                FetchOutcome::Empty => {
                    debug!(provider = provider.name(), symbol, "provider returned no data");
                }
                FetchOutcome::Failed(reason) => {
                    warn!(provider = provider.name(), symbol, reason = %reason, "provider failed");
                    last_failure = Some(format!("{}: {}", provider.name(), reason));
                }
            }
        }

        match last_failure {
            Some(reason) => FetchOutcome::Failed(reason),
            None => FetchOutcome::Empty,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::market_data::PriceBar;

    /// Provider returning a fixed outcome; shared with other test modules.
    pub(crate) struct StaticProvider {
        pub name: &'static str,
        pub outcome: FetchOutcome,
    }

    impl SeriesProvider for StaticProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fetch<'a>(
            &'a self,
            _symbol: &'a str,
            _period: &'a str,
            _interval: &'a str,
        ) -> BoxFuture<'a, FetchOutcome> {
            let outcome = self.outcome.clone();
            Box::pin(async move { outcome })
        }
    }

    fn one_bar_series() -> PriceSeries {
        PriceSeries::from_bars(vec![PriceBar {
            timestamp: 1,
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 100.0,
        }])
    }

    #[tokio::test]
    async fn first_non_empty_provider_wins() {
        let fetcher = FallbackFetcher::new(vec![
            Arc::new(StaticProvider { name: "down", outcome: FetchOutcome::Failed("timeout".into()) }),
            Arc::new(StaticProvider { name: "empty", outcome: FetchOutcome::Empty }),
            Arc::new(StaticProvider { name: "ok", outcome: FetchOutcome::Data(one_bar_series()) }),
        ]);
        match fetcher.fetch("X", "1d", "5m").await {
            FetchOutcome::Data(series) => assert_eq!(series.len(), 1),
            other => panic!("expected data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn all_empty_is_empty() {
        let fetcher = FallbackFetcher::new(vec![Arc::new(StaticProvider {
            name: "empty",
            outcome: FetchOutcome::Empty,
        })]);
        assert!(matches!(fetcher.fetch("X", "1d", "5m").await, FetchOutcome::Empty));
    }

    #[tokio::test]
    async fn failure_reason_is_reported() {
        let fetcher = FallbackFetcher::new(vec![
            Arc::new(StaticProvider { name: "down", outcome: FetchOutcome::Failed("503".into()) }),
            Arc::new(StaticProvider { name: "empty", outcome: FetchOutcome::Empty }),
        ]);
        match fetcher.fetch("X", "1d", "5m").await {
            FetchOutcome::Failed(reason) => assert_eq!(reason, "down: 503"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn empty_series_maps_to_empty_outcome() {
        assert!(matches!(FetchOutcome::from_series(PriceSeries::empty()), FetchOutcome::Empty));
        assert!(matches!(FetchOutcome::from_series(one_bar_series()), FetchOutcome::Data(_)));
    }
}
