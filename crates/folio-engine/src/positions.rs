//! The ordered position set and metric vectors aligned with it.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Label of the synthetic cash position.
pub const CASH: &str = "CASH";

/// Label of the synthetic whole-portfolio position.
pub const PORTFOLIO: &str = "PORTFOLIO";

/// The ordered labels of a portfolio's positions.
///
/// Real tickers sorted ascending, then [`CASH`], then [`PORTFOLIO`] -
/// always in that order. Everything downstream relies on this: slicing
/// "all but the last two" recovers exactly the real tickers, and every
/// metric vector is aligned index-for-index with this set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSet {
    labels: Vec<String>,
}

impl PositionSet {
    /// Builds the set from real tickers, appending the synthetic entries.
    ///
    /// # Errors
    ///
    /// Returns an error if a ticker is duplicated or collides with a
    /// synthetic label.
    pub fn from_tickers(tickers: impl IntoIterator<Item = impl Into<String>>) -> EngineResult<Self> {
        let mut labels: Vec<String> = tickers.into_iter().map(Into::into).collect();
        labels.sort();

        for window in labels.windows(2) {
            if window[0] == window[1] {
                return Err(EngineError::DuplicateTicker {
                    ticker: window[0].clone(),
                });
            }
        }
        for label in &labels {
            if label == CASH || label == PORTFOLIO {
                return Err(EngineError::ReservedTicker {
                    ticker: label.clone(),
                });
            }
        }

        labels.push(CASH.to_string());
        labels.push(PORTFOLIO.to_string());
        Ok(Self { labels })
    }

    /// Number of positions, including the two synthetic entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True only for a set with no real tickers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.len() == 2
    }

    /// All labels in order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The real tickers (all but the last two labels).
    #[must_use]
    pub fn tickers(&self) -> &[String] {
        &self.labels[..self.labels.len() - 2]
    }

    /// Index of a label, if present.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Index of the synthetic cash position.
    #[must_use]
    pub fn cash_index(&self) -> usize {
        self.labels.len() - 2
    }

    /// Index of the synthetic portfolio position.
    #[must_use]
    pub fn portfolio_index(&self) -> usize {
        self.labels.len() - 1
    }
}

/// A vector of per-position values aligned with a [`PositionSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValues {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl PositionValues {
    /// Pairs a value vector with the set it is aligned to.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ; alignment is a construction-time
    /// invariant, not a runtime condition.
    #[must_use]
    pub fn new(set: &PositionSet, values: Vec<f64>) -> Self {
        assert_eq!(set.len(), values.len(), "values not aligned with position set");
        Self {
            labels: set.labels().to_vec(),
            values,
        }
    }

    /// Value for a label, if present.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
    }

    /// Value at an index.
    #[must_use]
    pub fn at(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// The raw values in position-set order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates `(label, value)` pairs in position-set order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Value for the synthetic portfolio position.
    #[must_use]
    pub fn portfolio(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Value for the synthetic cash position.
    #[must_use]
    pub fn cash(&self) -> f64 {
        self.values[self.values.len() - 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_invariant() {
        let set = PositionSet::from_tickers(["NOKIA", "ACME", "BETA"]).unwrap();

        assert_eq!(
            set.labels(),
            &["ACME", "BETA", "NOKIA", "CASH", "PORTFOLIO"]
        );
        assert_eq!(set.tickers(), &["ACME", "BETA", "NOKIA"]);
        assert_eq!(set.cash_index(), 3);
        assert_eq!(set.portfolio_index(), 4);
    }

    #[test]
    fn test_empty_universe() {
        let set = PositionSet::from_tickers(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.labels(), &[CASH, PORTFOLIO]);
        assert!(set.tickers().is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = PositionSet::from_tickers(["ACME", "ACME"]);
        assert!(matches!(result, Err(EngineError::DuplicateTicker { .. })));
    }

    #[test]
    fn test_reserved_rejected() {
        let result = PositionSet::from_tickers(["ACME", "CASH"]);
        assert!(matches!(result, Err(EngineError::ReservedTicker { .. })));

        let result = PositionSet::from_tickers(["PORTFOLIO"]);
        assert!(matches!(result, Err(EngineError::ReservedTicker { .. })));
    }

    #[test]
    fn test_values_lookup() {
        let set = PositionSet::from_tickers(["A", "B"]).unwrap();
        let values = PositionValues::new(&set, vec![1.0, 2.0, 3.0, 6.0]);

        assert_eq!(values.get("A"), Some(1.0));
        assert_eq!(values.get("MISSING"), None);
        assert_eq!(values.cash(), 3.0);
        assert_eq!(values.portfolio(), 6.0);
        assert_eq!(values.iter().count(), 4);
    }
}
