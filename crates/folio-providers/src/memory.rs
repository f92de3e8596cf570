//! Map-backed provider implementation.

use crate::series::DateSeries;
use crate::traits::{IncomeDataProvider, MarketDataProvider};
use std::collections::HashMap;

/// An in-memory implementation of both provider traits.
///
/// Series are registered per ticker through the builder-style `with_*`
/// methods. Unregistered tickers resolve to an empty series and a lot size
/// of 1. Used by the engine's test suites and by thin calling programs
/// that materialize their data elsewhere.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    prices: HashMap<String, DateSeries>,
    volumes: HashMap<String, DateSeries>,
    lot_sizes: HashMap<String, u32>,
    dividends: HashMap<String, DateSeries>,
    price_index: DateSeries,
    empty: DateSeries,
}

impl InMemoryProvider {
    /// Creates a provider with no registered series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a price series for a ticker.
    #[must_use]
    pub fn with_prices(mut self, ticker: impl Into<String>, series: DateSeries) -> Self {
        self.prices.insert(ticker.into(), series);
        self
    }

    /// Registers a volume series for a ticker.
    #[must_use]
    pub fn with_volumes(mut self, ticker: impl Into<String>, series: DateSeries) -> Self {
        self.volumes.insert(ticker.into(), series);
        self
    }

    /// Registers a lot size for a ticker.
    #[must_use]
    pub fn with_lot_size(mut self, ticker: impl Into<String>, lot_size: u32) -> Self {
        self.lot_sizes.insert(ticker.into(), lot_size);
        self
    }

    /// Registers a dividend series for a ticker.
    #[must_use]
    pub fn with_dividends(mut self, ticker: impl Into<String>, series: DateSeries) -> Self {
        self.dividends.insert(ticker.into(), series);
        self
    }

    /// Registers the consumer price index series.
    #[must_use]
    pub fn with_price_index(mut self, series: DateSeries) -> Self {
        self.price_index = series;
        self
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn price_series(&self, ticker: &str) -> &DateSeries {
        self.prices.get(ticker).unwrap_or(&self.empty)
    }

    fn volume_series(&self, ticker: &str) -> &DateSeries {
        self.volumes.get(ticker).unwrap_or(&self.empty)
    }

    fn lot_size(&self, ticker: &str) -> u32 {
        self.lot_sizes.get(ticker).copied().unwrap_or(1)
    }
}

impl IncomeDataProvider for InMemoryProvider {
    fn dividend_series(&self, ticker: &str) -> &DateSeries {
        self.dividends.get(ticker).unwrap_or(&self.empty)
    }

    fn price_index(&self) -> &DateSeries {
        &self.price_index
    }
}
