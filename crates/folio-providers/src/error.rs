//! Error types for data providers.

use thiserror::Error;

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when constructing or querying provider data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// A series was constructed with two observations on the same date.
    #[error("Duplicate date in series: {date}")]
    DuplicateDate {
        /// The offending date (ISO 8601).
        date: String,
    },

    /// A series value is not a finite number.
    #[error("Non-finite value in series at {date}: {value}")]
    NonFiniteValue {
        /// The date of the offending observation (ISO 8601).
        date: String,
        /// The offending value.
        value: f64,
    },
}
