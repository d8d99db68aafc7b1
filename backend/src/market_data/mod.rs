pub mod provider;
pub mod series;
pub mod synthetic;
pub mod yahoo;

// Re-export the core types for convenient access (e.g. `use crate::market_data::PriceSeries`).
pub use provider::{FallbackFetcher, FetchOutcome, SeriesProvider};
pub use series::{PriceBar, PriceSeries};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooChartClient;
