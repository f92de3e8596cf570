//! # Folio Engine
//!
//! Two-objective equity rebalancing advisor.
//!
//! The engine values a lot-based portfolio against market data, estimates
//! exponentially-weighted return statistics and inflation-adjusted dividend
//! statistics per position, and searches for Pareto-dominated positions: a
//! holding is replaceable when some liquid alternative promises a strictly
//! better marginal contribution to both the portfolio's risk-adjusted
//! return and its dividend yield. The result is a diagnosis plus at most
//! one sized sell/buy trade pair, split into clips for phased execution.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: metric computations are stateless with explicit inputs
//! - **Eager evaluation**: every metric set is fully derived at construction
//! - **Provider seams**: market and income data arrive through synchronous traits
//! - **Advisory output**: the engine recommends, it never executes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use folio_engine::prelude::*;
//!
//! let portfolio = Portfolio::builder(report_date)
//!     .cash(1_000.0)
//!     .holding("A", 100)
//!     .holding("B", 50)
//!     .build(&market)?;
//!
//! let config = EngineConfig::default();
//! let returns = ReturnsMetrics::compute(&portfolio, &market, &config)?;
//! let dividends = DividendMetrics::compute(&portfolio, &income, &config)?;
//! let recommendation = recommend(&portfolio, &returns, &dividends, &market, &config)?;
//! println!("{recommendation}");
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Tunable parameters with validated defaults
//! - [`dividends`] - After-tax real dividend yield statistics
//! - [`error`] - Error and warning types
//! - [`metrics`] - The shared per-position statistics interface
//! - [`optimizer`] - Dominance search and trade sizing
//! - [`portfolio`] - Portfolio valuation and the builder
//! - [`positions`] - Position sets and aligned value vectors
//! - [`returns`] - Exponentially-weighted return statistics

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

// Module declarations
pub mod config;
mod dates;
pub mod dividends;
pub mod error;
pub mod metrics;
pub mod optimizer;
pub mod portfolio;
pub mod positions;
pub mod returns;

// Re-export error types at crate root
pub use error::{EngineError, EngineResult, Warning};

// Re-export main types
pub use config::EngineConfig;
pub use dividends::DividendMetrics;
pub use metrics::MetricsProvider;
pub use optimizer::{recommend, Recommendation, TradeLeg, TradeProposal};
pub use portfolio::{Portfolio, PortfolioBuilder};
pub use positions::{PositionSet, PositionValues, CASH, PORTFOLIO};
pub use returns::ReturnsMetrics;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use folio_engine::prelude::*;
/// ```
pub mod prelude {
    // Error types
    pub use crate::error::{EngineError, EngineResult, Warning};

    // Configuration
    pub use crate::config::EngineConfig;

    // Portfolio
    pub use crate::portfolio::{Portfolio, PortfolioBuilder};
    pub use crate::positions::{PositionSet, PositionValues, CASH, PORTFOLIO};

    // Metrics
    pub use crate::dividends::DividendMetrics;
    pub use crate::metrics::MetricsProvider;
    pub use crate::returns::ReturnsMetrics;

    // Optimizer
    pub use crate::optimizer::{recommend, Recommendation, TradeLeg, TradeProposal};

    // Re-export commonly used types from dependencies
    pub use chrono::NaiveDate;
    pub use folio_providers::{
        DateSeries, IncomeDataProvider, InMemoryProvider, MarketDataProvider,
    };
}
