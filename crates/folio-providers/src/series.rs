//! Ordered date-to-value series.

use crate::error::{ProviderError, ProviderResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An ordered historical series of `date -> f64` observations.
///
/// Observations are kept sorted ascending by date. Lookups that miss an
/// exact date fall back to the most recent prior observation
/// ([`DateSeries::at_or_before`]), which is how the engine forward-fills
/// over non-trading days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DateSeries {
    /// Creates an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from unordered `(date, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if two observations share a date or a value is not
    /// a finite number.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> ProviderResult<Self> {
        let mut points: Vec<(NaiveDate, f64)> = pairs.into_iter().collect();
        points.sort_by_key(|(date, _)| *date);

        for window in points.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(ProviderError::DuplicateDate {
                    date: window[0].0.to_string(),
                });
            }
        }
        for &(date, value) in &points {
            if !value.is_finite() {
                return Err(ProviderError::NonFiniteValue {
                    date: date.to_string(),
                    value,
                });
            }
        }

        Ok(Self { points })
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value at an exact date, if observed.
    #[must_use]
    pub fn at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|i| self.points[i].1)
    }

    /// Most recent observation at or before `date`.
    ///
    /// Returns the observation date actually used alongside the value, so
    /// callers can detect that a fallback occurred.
    #[must_use]
    pub fn at_or_before(&self, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        let idx = self.points.partition_point(|(d, _)| *d <= date);
        if idx == 0 {
            None
        } else {
            Some(self.points[idx - 1])
        }
    }

    /// The latest observation.
    #[must_use]
    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    /// The earliest observation date.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    /// Iterates observations in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().copied()
    }

    /// Observations with dates in the half-open interval `(after, up_to]`.
    pub fn between(
        &self,
        after: NaiveDate,
        up_to: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points
            .iter()
            .copied()
            .filter(move |(d, _)| *d > after && *d <= up_to)
    }
}
