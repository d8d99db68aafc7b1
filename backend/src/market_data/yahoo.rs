// =============================================================================
// Yahoo Finance chart client: public OHLCV endpoint
// =============================================================================
//
// GET /v8/finance/chart/{symbol}?range={period}&interval={interval}
//
// The response carries parallel arrays (timestamps plus open/high/low/close/
// volume) where any element may be null. Rows with a null price are skipped;
// a null volume is read as zero (indices report no volume).
// =============================================================================

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::market_data::{FetchOutcome, PriceBar, PriceSeries, SeriesProvider};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; index-advisor/1.0)";

/// Client for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (used for mirrors and tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into();
        debug!(base_url = %base_url, "YahooChartClient initialised");
        Ok(Self { base_url, client })
    }

    fn chart_url(&self, symbol: &str, period: &str, interval: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            symbol.replace('^', "%5E"),
            period,
            interval
        )
    }

    /// Fetch bars for `symbol` over `period` at `interval`.
    #[instrument(skip(self), name = "yahoo::get_chart")]
    pub async fn get_chart(&self, symbol: &str, period: &str, interval: &str) -> Result<PriceSeries> {
        let url = self.chart_url(symbol, period, interval);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read chart response body")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo GET /v8/finance/chart returned {}: {}", status, body);
        }

        let series = parse_chart_response(&body)?;
        debug!(symbol, interval, count = series.len(), "chart fetched");
        Ok(series)
    }
}

impl SeriesProvider for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch<'a>(
        &'a self,
        symbol: &'a str,
        period: &'a str,
        interval: &'a str,
    ) -> BoxFuture<'a, FetchOutcome> {
        Box::pin(async move {
            match self.get_chart(symbol, period, interval).await {
                Ok(series) => FetchOutcome::from_series(series),
                Err(e) => FetchOutcome::Failed(format!("{e:#}")),
            }
        })
    }
}

// =============================================================================
// Response schema
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Parse a chart response body into an ordered series.
///
/// # Edge cases
/// - An API-level `error` object becomes an `Err`.
/// - A missing result or quote block yields an empty series.
/// - Timestamps are seconds in the payload and converted to milliseconds;
///   a row whose timestamp overflows that conversion is dropped.
pub(crate) fn parse_chart_response(body: &str) -> Result<PriceSeries> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("failed to parse chart response")?;

    if let Some(err) = envelope.chart.error.filter(|e| !e.is_null()) {
        anyhow::bail!("Yahoo chart error: {}", err);
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(PriceSeries::empty());
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(timestamp) = ts.checked_mul(1000) else {
            debug!(ts, "chart row timestamp out of range");
            continue;
        };
        let field = |col: &[Option<f64>]| col.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };
        bars.push(PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: field(&quote.volume).unwrap_or(0.0),
        });
    }

    Ok(PriceSeries::from_bars(bars))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "^NSEI"},
                "timestamp": [1720583100, 1720583400, 1720583700],
                "indicators": {
                    "quote": [{
                        "open":   [24300.0, null,    24310.0],
                        "high":   [24320.0, 24330.0, 24340.0],
                        "low":    [24290.0, 24295.0, 24300.0],
                        "close":  [24310.0, 24325.0, 24335.0],
                        "volume": [null,    0,       1500]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_rows_and_skips_nulls() {
        let series = parse_chart_response(FIXTURE).unwrap();
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.timestamp, 1_720_583_100_000);
        assert_eq!(first.volume, 0.0);
        assert_eq!(series.last().unwrap().volume, 1500.0);
    }

    #[test]
    fn overflowing_timestamp_row_is_dropped() {
        let body = r#"{"chart":{"result":[{
            "timestamp": [92233720368547758, 1720583400],
            "indicators": {"quote": [{
                "open": [1.0, 2.0], "high": [1.0, 2.0], "low": [1.0, 2.0],
                "close": [1.0, 2.0], "volume": [10, 20]
            }]}
        }],"error":null}}"#;
        let series = parse_chart_response(body).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.last().unwrap().timestamp, 1_720_583_400_000);
    }

    #[test]
    fn api_error_is_reported() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let err = parse_chart_response(body).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn missing_result_is_empty() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(parse_chart_response(body).unwrap().is_empty());
    }

    #[test]
    fn caret_is_percent_encoded() {
        let client = YahooChartClient::with_base_url("http://localhost").unwrap();
        assert_eq!(
            client.chart_url("^BSESN", "1d", "5m"),
            "http://localhost/v8/finance/chart/%5EBSESN?range=1d&interval=5m"
        );
    }
}
