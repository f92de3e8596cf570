//! Configuration for the analytics engine.

use crate::error::{EngineError, EngineResult};
use folio_math::SolverConfig;
use serde::{Deserialize, Serialize};

/// Configuration for one engine evaluation.
///
/// An explicit value object passed by reference into every component
/// constructor; the engine never reads process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Confidence multiplier `t` applied to standard deviations.
    pub confidence: f64,

    /// Multiplier applied to dividend payments after tax.
    pub after_tax: f64,

    /// Maximum fraction of portfolio value moved in a single trade.
    pub max_trade_fraction: f64,

    /// Traded-value share of the portfolio below which a position is
    /// treated as effectively untradeable.
    pub liquidity_cutoff: f64,

    /// Search bracket for the decay-constant fit, inside (0, 1).
    pub decay_bracket: (f64, f64),

    /// Trailing window for dividend statistics, in years.
    pub dividend_years: usize,

    /// Fraction of the return history dropped before scoring the decay
    /// likelihood, letting the exponential window stabilize.
    pub burn_in_fraction: f64,

    /// Number of clips a trade leg is split into.
    pub trade_clips: u32,

    /// Interval tolerance for the decay-constant search.
    pub solver_tolerance: f64,

    /// Iteration budget for the decay-constant search.
    pub solver_max_iterations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence: 2.0,
            after_tax: 0.85,
            max_trade_fraction: 0.10,
            liquidity_cutoff: 0.02,
            decay_bracket: (0.84, 0.91),
            dividend_years: 5,
            burn_in_fraction: 0.20,
            trade_clips: 5,
            solver_tolerance: 1e-6,
            solver_max_iterations: 200,
        }
    }
}

impl EngineConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confidence multiplier.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the after-tax multiplier.
    #[must_use]
    pub fn with_after_tax(mut self, after_tax: f64) -> Self {
        self.after_tax = after_tax;
        self
    }

    /// Sets the maximum single-trade fraction.
    #[must_use]
    pub fn with_max_trade_fraction(mut self, fraction: f64) -> Self {
        self.max_trade_fraction = fraction;
        self
    }

    /// Sets the liquidity cutoff fraction.
    #[must_use]
    pub fn with_liquidity_cutoff(mut self, cutoff: f64) -> Self {
        self.liquidity_cutoff = cutoff;
        self
    }

    /// Sets the decay-constant search bracket.
    #[must_use]
    pub fn with_decay_bracket(mut self, lo: f64, hi: f64) -> Self {
        self.decay_bracket = (lo, hi);
        self
    }

    /// Sets the trailing dividend window in years.
    #[must_use]
    pub fn with_dividend_years(mut self, years: usize) -> Self {
        self.dividend_years = years;
        self
    }

    /// The solver configuration for the decay search.
    #[must_use]
    pub fn solver(&self) -> SolverConfig {
        SolverConfig::new(self.solver_tolerance, self.solver_max_iterations)
    }

    /// Validates every configured value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the first value that
    /// is out of range.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.confidence > 0.0) {
            return Err(EngineError::invalid_config(format!(
                "confidence must be positive, got {}",
                self.confidence
            )));
        }
        if !(0.0 < self.after_tax && self.after_tax <= 1.0) {
            return Err(EngineError::invalid_config(format!(
                "after_tax must be in (0, 1], got {}",
                self.after_tax
            )));
        }
        if !(0.0 < self.max_trade_fraction && self.max_trade_fraction <= 1.0) {
            return Err(EngineError::invalid_config(format!(
                "max_trade_fraction must be in (0, 1], got {}",
                self.max_trade_fraction
            )));
        }
        if !(self.liquidity_cutoff >= 0.0 && self.liquidity_cutoff.is_finite()) {
            return Err(EngineError::invalid_config(format!(
                "liquidity_cutoff must be non-negative, got {}",
                self.liquidity_cutoff
            )));
        }
        let (lo, hi) = self.decay_bracket;
        if !(0.0 < lo && lo < hi && hi < 1.0) {
            return Err(EngineError::invalid_config(format!(
                "decay_bracket must satisfy 0 < lo < hi < 1, got ({lo}, {hi})"
            )));
        }
        if self.dividend_years < 2 {
            return Err(EngineError::invalid_config(format!(
                "dividend_years must be at least 2, got {}",
                self.dividend_years
            )));
        }
        if !(0.0..1.0).contains(&self.burn_in_fraction) {
            return Err(EngineError::invalid_config(format!(
                "burn_in_fraction must be in [0, 1), got {}",
                self.burn_in_fraction
            )));
        }
        if self.trade_clips == 0 {
            return Err(EngineError::invalid_config("trade_clips must be positive"));
        }
        if !(self.solver_tolerance > 0.0) {
            return Err(EngineError::invalid_config(format!(
                "solver_tolerance must be positive, got {}",
                self.solver_tolerance
            )));
        }
        Ok(())
    }
}
