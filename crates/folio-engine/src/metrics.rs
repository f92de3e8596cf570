//! The statistics seam between the estimators and the optimizer.

use crate::error::Warning;
use crate::positions::PositionValues;

/// Per-position statistics consumed by the optimizer.
///
/// Implemented by the closed-form estimators in this crate
/// ([`crate::returns::ReturnsMetrics`] and
/// [`crate::dividends::DividendMetrics`]); the optimizer depends only on
/// this trait, so an alternative (e.g. learned) backend can be swapped in
/// without touching the decision logic.
pub trait MetricsProvider {
    /// Expected value of the underlying quantity per position.
    fn mean(&self) -> &PositionValues;

    /// Standard deviation per position.
    fn std(&self) -> &PositionValues;

    /// Sensitivity to the portfolio aggregate per position
    /// (0 for cash, 1 for the portfolio itself).
    fn beta(&self) -> &PositionValues;

    /// Marginal sensitivity of the portfolio risk measure to each
    /// position's weight. Weight-weighted gradients sum to zero.
    fn gradient(&self) -> &PositionValues;

    /// Advisory conditions raised while estimating.
    fn warnings(&self) -> &[Warning];
}

/// Marginal sensitivity of the portfolio risk measure to a position's
/// weight: `(t/2)^2 * (sigma_p/mu_p)^2 * (mu - mu_p - 2*mu_p*(beta - 1))`.
///
/// The weight-weighted sum of these over all positions is zero, since the
/// weighted means reproduce `mu_p` and the weighted betas reproduce 1.
pub(crate) fn marginal_gradient(
    confidence: f64,
    mu_p: f64,
    sigma_p: f64,
    mu: f64,
    beta: f64,
) -> f64 {
    let scale = (confidence / 2.0).powi(2) * (sigma_p / mu_p).powi(2);
    scale * (mu - mu_p - 2.0 * mu_p * (beta - 1.0))
}
