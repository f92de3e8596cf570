//! Error types for numerical operations.

use thiserror::Error;

/// A specialized Result type for numerical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during numerical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// A search algorithm failed to converge.
    #[error("Convergence failed after {iterations} iterations (interval width: {width:.2e})")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Width of the remaining search interval.
        width: f64,
    },

    /// Invalid bracket for a bracketed search.
    #[error("Invalid bracket: [{lo}, {hi}] is not a proper interval")]
    InvalidBracket {
        /// Lower bound of the bracket.
        lo: f64,
        /// Upper bound of the bracket.
        hi: f64,
    },

    /// The objective produced a non-finite value.
    #[error("Non-finite objective value at x = {x}")]
    NonFiniteValue {
        /// The point at which the objective was evaluated.
        x: f64,
    },

    /// Insufficient data points for the operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// Input slices have mismatched lengths.
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first input.
        left: usize,
        /// Length of the second input.
        right: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates a convergence failed error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, width: f64) -> Self {
        Self::ConvergenceFailed { iterations, width }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
