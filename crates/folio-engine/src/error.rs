//! Error and warning types for the analytics engine.
//!
//! Fatal conditions are [`EngineError`] values that abort the current
//! evaluation. Advisory conditions are [`Warning`] values: they are logged
//! through the `log` facade when detected and carried in component output
//! so the caller can render them.

use folio_math::MathError;
use folio_providers::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort an evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Externally supplied expected portfolio value does not match.
    #[error("Portfolio value mismatch: expected {expected}, computed {computed}")]
    ValueMismatch {
        /// The value supplied by the caller.
        expected: f64,
        /// The value computed from holdings and prices.
        computed: f64,
    },

    /// A ticker appears more than once in the holdings.
    #[error("Duplicate ticker: {ticker}")]
    DuplicateTicker {
        /// The duplicated ticker.
        ticker: String,
    },

    /// A ticker collides with a synthetic position label.
    #[error("Reserved ticker: {ticker}")]
    ReservedTicker {
        /// The offending ticker.
        ticker: String,
    },

    /// Not enough aligned history to fit the return statistics.
    #[error("Insufficient history: need at least {required} monthly returns, got {actual}")]
    InsufficientHistory {
        /// Minimum required monthly returns.
        required: usize,
        /// Aligned monthly returns available.
        actual: usize,
    },

    /// Every real position has zero weight.
    #[error("Portfolio has no nonzero weighted positions")]
    NoHeldPositions,

    /// A statistic consumed for the trade decision is not a finite number.
    #[error("Non-finite {metric} for position '{ticker}'")]
    NonFiniteMetric {
        /// The position label.
        ticker: String,
        /// The metric that was not finite.
        metric: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the invalid value.
        reason: String,
    },

    /// A numerical operation failed.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Provider data was malformed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl EngineError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Creates a non-finite metric error.
    #[must_use]
    pub fn non_finite(ticker: impl Into<String>, metric: impl Into<String>) -> Self {
        Self::NonFiniteMetric {
            ticker: ticker.into(),
            metric: metric.into(),
        }
    }
}

/// Advisory conditions surfaced alongside results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// The report date had no close price; a prior trading date was used.
    PriceFallback {
        /// The ticker whose price fell back.
        ticker: String,
        /// The requested report date.
        requested: chrono::NaiveDate,
        /// The trading date actually used.
        used: chrono::NaiveDate,
    },

    /// A ticker has no price history at all; it was priced at zero.
    MissingPrices {
        /// The ticker with no prices.
        ticker: String,
    },

    /// The fitted decay constant landed near a search-bracket edge.
    DecayNearBracketEdge {
        /// The fitted decay constant.
        fitted: f64,
        /// Lower edge of the bracket.
        lo: f64,
        /// Upper edge of the bracket.
        hi: f64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceFallback {
                ticker,
                requested,
                used,
            } => write!(
                f,
                "{ticker}: no close on {requested}, using {used}"
            ),
            Self::MissingPrices { ticker } => {
                write!(f, "{ticker}: no price history, priced at 0")
            }
            Self::DecayNearBracketEdge { fitted, lo, hi } => write!(
                f,
                "fitted decay {fitted:.4} is near the edge of [{lo}, {hi}]; consider widening the bracket"
            ),
        }
    }
}
