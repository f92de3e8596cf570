//! Portfolio valuation: holdings into priced, weighted, date-anchored state.

use crate::error::{EngineError, EngineResult, Warning};
use crate::positions::{PositionSet, PositionValues};
use chrono::NaiveDate;
use folio_providers::MarketDataProvider;

/// Relative tolerance for the externally supplied value cross-check.
const VALUE_TOLERANCE: f64 = 1e-6;

/// A holder's portfolio valued at a report date.
///
/// Immutable once constructed: every derived quantity (lot sizes, shares,
/// prices, values, weights) is built once by [`PortfolioBuilder::build`]
/// and never mutated. Changing the report date means rebuilding via
/// [`Portfolio::with_date`].
///
/// Cash is a synthetic position with lot size 1 and price 1; the synthetic
/// `PORTFOLIO` entry carries the total value and weight 1.
#[derive(Debug, Clone)]
pub struct Portfolio {
    date: NaiveDate,
    cash: f64,
    positions: PositionSet,
    lots: Vec<u64>,
    lot_size: PositionValues,
    shares: PositionValues,
    price: PositionValues,
    value: PositionValues,
    weight: PositionValues,
    warnings: Vec<Warning>,
}

impl Portfolio {
    /// Creates a new portfolio builder.
    #[must_use]
    pub fn builder(date: NaiveDate) -> PortfolioBuilder {
        PortfolioBuilder::new(date)
    }

    /// The report date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The cash amount.
    #[must_use]
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// The ordered position set.
    #[must_use]
    pub fn positions(&self) -> &PositionSet {
        &self.positions
    }

    /// Lot counts aligned with [`PositionSet::tickers`].
    #[must_use]
    pub fn lots(&self) -> &[u64] {
        &self.lots
    }

    /// Lot count for a real ticker.
    #[must_use]
    pub fn lots_of(&self, ticker: &str) -> Option<u64> {
        self.positions
            .tickers()
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.lots[i])
    }

    /// Lot sizes per position (1 for the synthetic entries).
    #[must_use]
    pub fn lot_size(&self) -> &PositionValues {
        &self.lot_size
    }

    /// Shares per position (`lot_size * lots`; the cash amount for CASH).
    #[must_use]
    pub fn shares(&self) -> &PositionValues {
        &self.shares
    }

    /// Close prices at the report date, forward-filled.
    #[must_use]
    pub fn price(&self) -> &PositionValues {
        &self.price
    }

    /// Market values per position.
    #[must_use]
    pub fn value(&self) -> &PositionValues {
        &self.value
    }

    /// Portfolio weights per position (the PORTFOLIO entry is 1).
    #[must_use]
    pub fn weight(&self) -> &PositionValues {
        &self.weight
    }

    /// Total portfolio value (holdings plus cash).
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.value.portfolio()
    }

    /// Advisory conditions raised during valuation.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Revalues the same holdings at a different report date.
    ///
    /// # Errors
    ///
    /// Propagates any construction error from the rebuild.
    pub fn with_date(
        &self,
        date: NaiveDate,
        market: &impl MarketDataProvider,
    ) -> EngineResult<Self> {
        let mut builder = PortfolioBuilder::new(date).cash(self.cash);
        for (ticker, &lots) in self.positions.tickers().iter().zip(&self.lots) {
            builder = builder.holding(ticker.clone(), lots);
        }
        builder.build(market)
    }
}

/// Builder for [`Portfolio`].
///
/// # Example
///
/// ```rust,ignore
/// let portfolio = Portfolio::builder(date)
///     .cash(1000.0)
///     .holding("ACME", 100)
///     .holding("BETA", 50)
///     .expected_value(3000.0)
///     .build(&market)?;
/// ```
#[derive(Debug, Clone)]
pub struct PortfolioBuilder {
    date: NaiveDate,
    cash: f64,
    holdings: Vec<(String, u64)>,
    expected_value: Option<f64>,
}

impl PortfolioBuilder {
    /// Creates a builder for the given report date.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cash: 0.0,
            holdings: Vec::new(),
            expected_value: None,
        }
    }

    /// Sets the cash amount.
    #[must_use]
    pub fn cash(mut self, cash: f64) -> Self {
        self.cash = cash;
        self
    }

    /// Adds a holding. A lot count of 0 means "tracked but not held".
    #[must_use]
    pub fn holding(mut self, ticker: impl Into<String>, lots: u64) -> Self {
        self.holdings.push((ticker.into(), lots));
        self
    }

    /// Supplies an expected total value to cross-check construction.
    #[must_use]
    pub fn expected_value(mut self, value: f64) -> Self {
        self.expected_value = Some(value);
        self
    }

    /// Values the holdings and builds the portfolio.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateTicker`] / [`EngineError::ReservedTicker`]
    ///   for malformed holdings
    /// - [`EngineError::InvalidConfig`] for negative cash
    /// - [`EngineError::ValueMismatch`] when the expected total value
    ///   differs by more than the relative tolerance
    pub fn build(self, market: &impl MarketDataProvider) -> EngineResult<Portfolio> {
        if !(self.cash >= 0.0) {
            return Err(EngineError::invalid_config(format!(
                "cash must be non-negative, got {}",
                self.cash
            )));
        }

        let positions = PositionSet::from_tickers(self.holdings.iter().map(|(t, _)| t.clone()))?;

        // Re-key lot counts to the sorted ticker order
        let lots: Vec<u64> = positions
            .tickers()
            .iter()
            .map(|ticker| {
                self.holdings
                    .iter()
                    .find(|(t, _)| t == ticker)
                    .map(|(_, lots)| *lots)
                    .unwrap_or(0)
            })
            .collect();

        let mut warnings = Vec::new();
        let n = positions.len();
        let mut lot_size = vec![1.0; n];
        let mut shares = vec![0.0; n];
        let mut price = vec![0.0; n];
        let mut value = vec![0.0; n];

        for (i, ticker) in positions.tickers().iter().enumerate() {
            lot_size[i] = f64::from(market.lot_size(ticker));
            shares[i] = lot_size[i] * lots[i] as f64;
            price[i] = match market.price_series(ticker).at_or_before(self.date) {
                Some((used, close)) => {
                    if used != self.date {
                        log::warn!("{ticker}: no close on {}, using {used}", self.date);
                        warnings.push(Warning::PriceFallback {
                            ticker: ticker.clone(),
                            requested: self.date,
                            used,
                        });
                    }
                    close
                }
                None => {
                    log::warn!("{ticker}: no price history, priced at 0");
                    warnings.push(Warning::MissingPrices {
                        ticker: ticker.clone(),
                    });
                    0.0
                }
            };
            value[i] = shares[i] * price[i];
        }

        let cash_idx = positions.cash_index();
        let portfolio_idx = positions.portfolio_index();
        shares[cash_idx] = self.cash;
        price[cash_idx] = 1.0;
        value[cash_idx] = self.cash;

        let total: f64 = value[..cash_idx].iter().sum::<f64>() + self.cash;
        shares[portfolio_idx] = 1.0;
        price[portfolio_idx] = total;
        value[portfolio_idx] = total;

        if let Some(expected) = self.expected_value {
            if (total - expected).abs() > VALUE_TOLERANCE * expected.abs().max(1.0) {
                return Err(EngineError::ValueMismatch {
                    expected,
                    computed: total,
                });
            }
        }

        let weight: Vec<f64> = if total > 0.0 {
            value.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; n]
        };

        Ok(Portfolio {
            date: self.date,
            cash: self.cash,
            lots,
            lot_size: PositionValues::new(&positions, lot_size),
            shares: PositionValues::new(&positions, shares),
            price: PositionValues::new(&positions, price),
            value: PositionValues::new(&positions, value),
            weight: PositionValues::new(&positions, weight),
            positions,
            warnings,
        })
    }
}
