//! Provider traits for market and income data.
//!
//! Both traits are synchronous: the engine operates on already-materialized
//! history, and any fetching, caching, or retry logic belongs to the
//! implementation behind the trait.
//!
//! A ticker with no data is represented by an empty [`DateSeries`], not an
//! error - the engine treats "no prices yet" as a valid (zero-priced)
//! state and decides for itself what is fatal.

use crate::series::DateSeries;

/// Source of price, traded-volume, and lot-size reference data.
pub trait MarketDataProvider {
    /// Daily close-price history for a ticker.
    fn price_series(&self, ticker: &str) -> &DateSeries;

    /// Daily traded-volume history for a ticker.
    fn volume_series(&self, ticker: &str) -> &DateSeries;

    /// Minimum tradeable unit multiplier for a ticker (1 when unknown).
    fn lot_size(&self, ticker: &str) -> u32;
}

/// Source of dividend payments and the consumer price index.
pub trait IncomeDataProvider {
    /// Dividend payment history for a ticker (per-share amounts).
    fn dividend_series(&self, ticker: &str) -> &DateSeries;

    /// Monthly consumer price index level used for deflation.
    fn price_index(&self) -> &DateSeries;
}
