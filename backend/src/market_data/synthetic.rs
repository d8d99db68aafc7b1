// =============================================================================
// Synthetic series: deterministic stand-in when live providers fail
// =============================================================================
//
// Prices follow a mean-reverting random walk around a per-symbol base price,
// clamped to [0.8, 1.2] x base. Intraday bars cover one Indian cash session
// (09:15 – 15:30 IST); daily bars cover a calendar year. The generator is
// seeded, so the same request always yields the same series.
// =============================================================================

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use futures_util::future::BoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::market_data::{FetchOutcome, PriceBar, PriceSeries, SeriesProvider};
use crate::market_hours::{ist, session_bounds};

const DEFAULT_SEED: u64 = 42;

/// Base price for a ticker; unknown tickers start at 100.
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "^BSESN" | "SENSEX.NS" => 84_400.0,
        "^NSEI" | "NIFTY50.NS" => 25_000.0,
        "^NSEBANK" | "BANKNIFTY.NS" => 52_000.0,
        "CL=F" => 70.0,
        _ => 100.0,
    }
}

/// Bar spacing parsed from an interval string such as `5m`, `1h` or `1d`.
/// Unknown intervals are treated as 5 minutes.
fn interval_minutes(interval: &str) -> i64 {
    match interval {
        "1m" => 1,
        "5m" => 5,
        "15m" => 15,
        "30m" => 30,
        "60m" | "1h" => 60,
        "1d" => 24 * 60,
        _ => 5,
    }
}

/// Seeded generator of synthetic OHLCV series.
pub struct SyntheticProvider {
    seed: u64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate a series for `symbol` anchored at `now`.
    pub fn generate(&self, symbol: &str, interval: &str, now: DateTime<Utc>) -> PriceSeries {
        let step = interval_minutes(interval);
        let timestamps = if step >= 24 * 60 {
            daily_timestamps(now, 365)
        } else {
            session_timestamps(now, step)
        };
        let intraday = step < 24 * 60;

        let base = base_price(symbol);
        let (sigma, reversion) = if intraday { (0.003, 0.15) } else { (0.01, 0.05) };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut bars = Vec::with_capacity(timestamps.len());
        let mut price = base;
        let mut prev_close: Option<f64> = None;

        for ts in timestamps {
            let change = normal(&mut rng) * base * sigma;
            price += change + (base - price) * reversion;
            price = price.clamp(base * 0.8, base * 1.2);

            let spread = (normal(&mut rng) * price * 0.01).abs();
            let open = prev_close.unwrap_or(price);
            let high = (price + spread).max(open);
            let low = (price - spread).min(open);
            let volume = rng.gen_range(100_000..10_000_000) as f64;

            bars.push(PriceBar {
                timestamp: ts,
                open,
                high,
                low,
                close: price,
                volume,
            });
            prev_close = Some(price);
        }

        PriceSeries::from_bars(bars)
    }
}

impl SeriesProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn fetch<'a>(
        &'a self,
        symbol: &'a str,
        _period: &'a str,
        interval: &'a str,
    ) -> BoxFuture<'a, FetchOutcome> {
        let series = self.generate(symbol, interval, Utc::now());
        Box::pin(async move { FetchOutcome::from_series(series) })
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Standard normal sample (Box–Muller).
fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Timestamps for the most recent weekday session on or before `now`, from
/// 09:15 to 15:30 IST inclusive.
fn session_timestamps(now: DateTime<Utc>, step_minutes: i64) -> Vec<i64> {
    let tz = ist();
    let mut day = now.with_timezone(&tz).date_naive();
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day = day.pred_opt().unwrap_or(day);
    }

    let (open, close) = session_bounds();
    let (Some(start), Some(end)) = (
        tz.from_local_datetime(&day.and_time(open)).single(),
        tz.from_local_datetime(&day.and_time(close)).single(),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut t = start;
    while t <= end {
        out.push(t.timestamp_millis());
        t += Duration::minutes(step_minutes);
    }
    out
}

/// One timestamp per calendar day, ending at `now`.
fn daily_timestamps(now: DateTime<Utc>, days: i64) -> Vec<i64> {
    (0..days)
        .rev()
        .map(|d| (now - Duration::days(d)).timestamp_millis())
        .collect()
}
