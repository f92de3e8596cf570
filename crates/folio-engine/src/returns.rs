//! Monthly price-return statistics under an exponentially weighted model.
//!
//! The estimator resamples daily closes to month-end points anchored on the
//! report date's day-of-month, fits the decay constant by maximizing the
//! Gaussian one-step-ahead log-likelihood of the portfolio return, and
//! derives per-position EWMA statistics, betas, expected drawdowns, and
//! marginal gradients at the fitted constant.

use crate::config::EngineConfig;
use crate::dates::shift_months;
use crate::error::{EngineError, EngineResult, Warning};
use crate::metrics::{marginal_gradient, MetricsProvider};
use crate::portfolio::Portfolio;
use crate::positions::PositionValues;
use folio_math::ewma::{self, Smoother};
use folio_math::golden_section_max;
use folio_providers::MarketDataProvider;
use statrs::distribution::{Continuous, Normal};

/// Minimum aligned monthly returns required to fit the model.
const MIN_MONTHLY_RETURNS: usize = 12;

/// Keeps the likelihood finite before the exponential window has
/// accumulated any dispersion.
const VARIANCE_FLOOR: f64 = 1e-18;

/// Monthly return statistics for every position and the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsMetrics {
    decay: f64,
    mean: PositionValues,
    std: PositionValues,
    beta: PositionValues,
    draw_down: Vec<Option<f64>>,
    gradient: PositionValues,
    time_to_draw_down: Option<f64>,
    std_at_draw_down: Option<f64>,
    warnings: Vec<Warning>,
}

impl ReturnsMetrics {
    /// Fits the model and derives all statistics for a portfolio.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InsufficientHistory`] when fewer than 12 aligned
    ///   monthly returns are available across the universe
    /// - [`EngineError::Math`] when the decay search fails to converge or
    ///   the likelihood is not finite
    /// - [`EngineError::InvalidConfig`] for an out-of-range configuration
    pub fn compute(
        portfolio: &Portfolio,
        market: &impl MarketDataProvider,
        config: &EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;

        let set = portfolio.positions();
        let anchors = anchor_dates(portfolio, market)?;
        let n = anchors.len() - 1;

        // Per-ticker monthly returns over the common span
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(set.len());
        for ticker in set.tickers() {
            let series = market.price_series(ticker);
            let prices: Vec<f64> = anchors
                .iter()
                .map(|&anchor| {
                    series
                        .at_or_before(anchor)
                        .map(|(_, close)| close)
                        .unwrap_or(0.0)
                })
                .collect();
            rows.push(prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect());
        }

        // Cash earns nothing; the portfolio is the report-date weighted sum
        let weight = portfolio.weight();
        let mut portfolio_row = vec![0.0; n];
        for (i, row) in rows.iter().enumerate() {
            let w = weight.at(i);
            for (t, r) in row.iter().enumerate() {
                portfolio_row[t] += w * r;
            }
        }
        rows.push(vec![0.0; n]);

        let (lo, hi) = config.decay_bracket;
        let burn_in = (n as f64 * config.burn_in_fraction).floor() as usize;
        let fit = golden_section_max(
            |d| log_likelihood(&portfolio_row, d, burn_in),
            lo,
            hi,
            &config.solver(),
        )?;
        let decay = fit.argmax;

        let mut warnings = Vec::new();
        let edge = (hi - lo) * 0.01;
        if decay - lo < edge || hi - decay < edge {
            log::warn!(
                "fitted decay {decay:.4} is near the edge of [{lo}, {hi}]; consider widening the bracket"
            );
            warnings.push(Warning::DecayNearBracketEdge {
                fitted: decay,
                lo,
                hi,
            });
        }

        rows.push(portfolio_row);
        let portfolio_row = rows.last().expect("portfolio row just pushed");

        let t = config.confidence;
        let mu_p = ewma::mean(portfolio_row, decay)?;
        let var_p = ewma::variance(portfolio_row, decay)?;
        let sigma_p = var_p.sqrt();

        let size = set.len();
        let cash_idx = set.cash_index();
        let portfolio_idx = set.portfolio_index();
        let mut mean_v = vec![0.0; size];
        let mut std_v = vec![0.0; size];
        let mut beta_v = vec![0.0; size];
        let mut draw_down = vec![None; size];
        let mut gradient_v = vec![0.0; size];

        for (i, row) in rows.iter().enumerate() {
            mean_v[i] = ewma::mean(row, decay)?;
            std_v[i] = ewma::std(row, decay)?;
            beta_v[i] = if var_p > 0.0 {
                ewma::covariance(row, portfolio_row, decay)? / var_p
            } else if i == portfolio_idx {
                1.0
            } else {
                0.0
            };
            draw_down[i] = if i == cash_idx {
                Some(0.0)
            } else if mean_v[i] > 0.0 {
                Some(-(t * std_v[i]).powi(2) / (4.0 * mean_v[i]))
            } else {
                None
            };
            gradient_v[i] = marginal_gradient(t, mu_p, sigma_p, mean_v[i], beta_v[i]);
        }

        let (time_to_draw_down, std_at_draw_down) = if mu_p > 0.0 {
            (
                Some((sigma_p * t / (2.0 * mu_p)).powi(2)),
                Some((t / 2.0) * (var_p / mu_p)),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            decay,
            mean: PositionValues::new(set, mean_v),
            std: PositionValues::new(set, std_v),
            beta: PositionValues::new(set, beta_v),
            draw_down,
            gradient: PositionValues::new(set, gradient_v),
            time_to_draw_down,
            std_at_draw_down,
            warnings,
        })
    }

    /// The fitted decay constant.
    #[must_use]
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// EWMA mean monthly return per position.
    #[must_use]
    pub fn mean(&self) -> &PositionValues {
        &self.mean
    }

    /// EWMA monthly return standard deviation per position.
    #[must_use]
    pub fn std(&self) -> &PositionValues {
        &self.std
    }

    /// EWMA beta against the portfolio return per position.
    #[must_use]
    pub fn beta(&self) -> &PositionValues {
        &self.beta
    }

    /// Expected drawdown per position, aligned with the position set.
    /// `None` where the expected return is not positive.
    #[must_use]
    pub fn draw_down(&self) -> &[Option<f64>] {
        &self.draw_down
    }

    /// Marginal drawdown gradient per position.
    #[must_use]
    pub fn gradient(&self) -> &PositionValues {
        &self.gradient
    }

    /// Expected periods until the drawdown trough.
    #[must_use]
    pub fn time_to_draw_down(&self) -> Option<f64> {
        self.time_to_draw_down
    }

    /// Portfolio standard deviation accumulated at the drawdown trough.
    #[must_use]
    pub fn std_at_draw_down(&self) -> Option<f64> {
        self.std_at_draw_down
    }

    /// Advisory conditions raised during fitting.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl MetricsProvider for ReturnsMetrics {
    fn mean(&self) -> &PositionValues {
        &self.mean
    }

    fn std(&self) -> &PositionValues {
        &self.std
    }

    fn beta(&self) -> &PositionValues {
        &self.beta
    }

    fn gradient(&self) -> &PositionValues {
        &self.gradient
    }

    fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Month-end anchor dates on the report date's day-of-month, oldest first,
/// spanning the intersection of every real ticker's price history.
fn anchor_dates(
    portfolio: &Portfolio,
    market: &impl MarketDataProvider,
) -> EngineResult<Vec<chrono::NaiveDate>> {
    let mut earliest = None;
    for ticker in portfolio.positions().tickers() {
        let first = market
            .price_series(ticker)
            .first_date()
            .ok_or(EngineError::InsufficientHistory {
                required: MIN_MONTHLY_RETURNS,
                actual: 0,
            })?;
        earliest = Some(earliest.map_or(first, |e: chrono::NaiveDate| e.max(first)));
    }
    let Some(earliest) = earliest else {
        return Err(EngineError::InsufficientHistory {
            required: MIN_MONTHLY_RETURNS,
            actual: 0,
        });
    };

    let mut anchors = Vec::new();
    let mut k = 0;
    loop {
        let anchor = shift_months(portfolio.date(), -k);
        if anchor < earliest {
            break;
        }
        anchors.push(anchor);
        k += 1;
    }
    anchors.reverse();

    if anchors.len() < MIN_MONTHLY_RETURNS + 1 {
        return Err(EngineError::InsufficientHistory {
            required: MIN_MONTHLY_RETURNS,
            actual: anchors.len().saturating_sub(1),
        });
    }
    Ok(anchors)
}

/// One-step-ahead Gaussian log-likelihood of a return series under an
/// EWMA mean/variance model with the given decay constant.
///
/// Each return is scored against the smoothed state accumulated strictly
/// before it; the first `burn_in` periods are skipped so the exponential
/// window can stabilize. Returns NaN on a degenerate state, which the
/// golden-section search surfaces as a non-finite objective.
fn log_likelihood(returns: &[f64], decay: f64, burn_in: usize) -> f64 {
    let Ok(mut smoother) = Smoother::new(decay) else {
        return f64::NAN;
    };

    let mut ll = 0.0;
    for (t, &r) in returns.iter().enumerate() {
        if t > 0 && t >= burn_in {
            let sigma = smoother.variance().max(VARIANCE_FLOOR).sqrt();
            match Normal::new(smoother.mean(), sigma) {
                Ok(normal) => ll += normal.ln_pdf(r),
                Err(_) => return f64::NAN,
            }
        }
        smoother.update(r);
    }
    ll
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::{CASH, PORTFOLIO};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use folio_providers::{DateSeries, InMemoryProvider};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hash(seed: u64, i: u64) -> u64 {
        let mut x = seed.wrapping_add(i).wrapping_mul(0x517c_c1b7_2722_0a95);
        x ^= x >> 32;
        x = x.wrapping_mul(0x517c_c1b7_2722_0a95);
        x ^= x >> 32;
        x
    }

    /// Monthly price observations on the report-date anchor days, driven
    /// by deterministic pseudo-random returns around `drift`.
    fn monthly_prices(seed: u64, months: i32, report: NaiveDate, drift: f64) -> DateSeries {
        let mut price = 100.0;
        let mut pairs = Vec::new();
        for k in (0..=months).rev() {
            let anchor = shift_months(report, -k);
            pairs.push((anchor, price));
            let noise = (hash(seed, k as u64) % 1000) as f64 / 1000.0 - 0.5;
            price *= 1.0 + drift + 0.04 * noise;
        }
        DateSeries::from_pairs(pairs).unwrap()
    }

    fn test_market(report: NaiveDate) -> InMemoryProvider {
        InMemoryProvider::new()
            .with_prices("A", monthly_prices(7, 48, report, 0.012))
            .with_prices("B", monthly_prices(13, 48, report, 0.008))
    }

    fn test_portfolio(report: NaiveDate, market: &InMemoryProvider) -> Portfolio {
        Portfolio::builder(report)
            .cash(1000.0)
            .holding("A", 100)
            .holding("B", 50)
            .build(market)
            .unwrap()
    }

    #[test]
    fn test_decay_in_bracket() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);
        let config = EngineConfig::default();

        let metrics = ReturnsMetrics::compute(&portfolio, &market, &config).unwrap();

        let (lo, hi) = config.decay_bracket;
        assert!(metrics.decay() >= lo && metrics.decay() <= hi);
    }

    #[test]
    fn test_beta_identities() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let metrics =
            ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        assert_relative_eq!(metrics.beta().get(CASH).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.beta().get(PORTFOLIO).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_gradient_sums_to_zero() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let metrics =
            ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        let sum: f64 = portfolio
            .weight()
            .values()
            .iter()
            .zip(metrics.gradient().values())
            .take(portfolio.positions().len() - 1)
            .map(|(w, g)| w * g)
            .sum();
        assert_relative_eq!(sum, 0.0, epsilon = 1e-9);

        // The portfolio's own gradient is identically zero
        assert_relative_eq!(
            metrics.gradient().get(PORTFOLIO).unwrap(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_cash_statistics() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let metrics =
            ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        assert_relative_eq!(metrics.mean().get(CASH).unwrap(), 0.0);
        assert_relative_eq!(metrics.std().get(CASH).unwrap(), 0.0);
        let cash_idx = portfolio.positions().cash_index();
        assert_eq!(metrics.draw_down()[cash_idx], Some(0.0));
    }

    #[test]
    fn test_drawdown_sign_and_undefined() {
        let report = date(2025, 9, 19);
        let market = InMemoryProvider::new()
            .with_prices("UP", monthly_prices(7, 48, report, 0.015))
            .with_prices("DOWN", monthly_prices(13, 48, report, -0.02));
        let portfolio = Portfolio::builder(report)
            .cash(100.0)
            .holding("UP", 100)
            .holding("DOWN", 10)
            .build(&market)
            .unwrap();

        let metrics =
            ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        let up_idx = portfolio.positions().index_of("UP").unwrap();
        let down_idx = portfolio.positions().index_of("DOWN").unwrap();
        assert!(metrics.draw_down()[up_idx].unwrap() < 0.0);
        assert!(metrics.mean().get("DOWN").unwrap() < 0.0);
        assert_eq!(metrics.draw_down()[down_idx], None);
    }

    #[test]
    fn test_recomputation_is_identical() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);
        let config = EngineConfig::default();

        let first = ReturnsMetrics::compute(&portfolio, &market, &config).unwrap();
        let second = ReturnsMetrics::compute(&portfolio, &market, &config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_insufficient_history() {
        let report = date(2025, 9, 19);
        let market = InMemoryProvider::new()
            .with_prices("A", monthly_prices(7, 6, report, 0.01))
            .with_prices("B", monthly_prices(13, 48, report, 0.01));
        let portfolio = test_portfolio(report, &market);

        // The common span is limited by A's short history
        let result = ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn test_no_price_history_at_all() {
        let report = date(2025, 9, 19);
        let market = InMemoryProvider::new();
        let portfolio = Portfolio::builder(report)
            .cash(100.0)
            .holding("GHOST", 1)
            .build(&market)
            .unwrap();

        let result = ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InsufficientHistory { actual: 0, .. })
        ));
    }

    #[test]
    fn test_drawdown_scalars_match_closed_forms() {
        let report = date(2025, 9, 19);
        let market = InMemoryProvider::new()
            .with_prices("A", monthly_prices(7, 48, report, 0.02))
            .with_prices("B", monthly_prices(13, 48, report, 0.018));
        let portfolio = test_portfolio(report, &market);
        let config = EngineConfig::default();

        let metrics = ReturnsMetrics::compute(&portfolio, &market, &config).unwrap();

        let mu_p = metrics.mean().get(PORTFOLIO).unwrap();
        let sigma_p = metrics.std().get(PORTFOLIO).unwrap();
        assert!(mu_p > 0.0);

        let t = config.confidence;
        assert_relative_eq!(
            metrics.time_to_draw_down().unwrap(),
            (sigma_p * t / (2.0 * mu_p)).powi(2),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            metrics.std_at_draw_down().unwrap(),
            (t / 2.0) * sigma_p.powi(2) / mu_p,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_drawdown_scalars_undefined_for_declining_portfolio() {
        let report = date(2025, 9, 19);
        let market = InMemoryProvider::new()
            .with_prices("A", monthly_prices(7, 48, report, -0.02))
            .with_prices("B", monthly_prices(13, 48, report, -0.025));
        let portfolio = test_portfolio(report, &market);

        let metrics =
            ReturnsMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        assert!(metrics.mean().get(PORTFOLIO).unwrap() < 0.0);
        assert_eq!(metrics.time_to_draw_down(), None);
        assert_eq!(metrics.std_at_draw_down(), None);
    }

    #[test]
    fn test_sliver_bracket_warns_near_edge() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);
        // A bracket this narrow cannot contain the optimum; the fit lands
        // on a boundary and must be flagged as advisory
        let config = EngineConfig::default().with_decay_bracket(0.8400, 0.8402);

        let metrics = ReturnsMetrics::compute(&portfolio, &market, &config).unwrap();

        assert!(metrics
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::DecayNearBracketEdge { .. })));
    }

    /// Standard normal draw from two deterministic uniforms, clipped.
    fn gaussian(seed_a: u64, seed_b: u64, i: u64) -> f64 {
        let u1 = ((hash(seed_a, i) % 100_000) + 1) as f64 / 100_001.0;
        let u2 = ((hash(seed_b, i) % 100_000) + 1) as f64 / 100_001.0;
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        z.clamp(-3.0, 3.0)
    }

    #[test]
    fn test_decay_recovery_on_synthetic_series() {
        // A series generated from the EWMA model itself: after a fixed-
        // dispersion warm-up, each return is drawn from the smoothed
        // conditional state at the generating constant.
        let d0 = 0.875;
        let mut smoother = Smoother::new(d0).unwrap();
        let mut returns = Vec::with_capacity(420);
        for i in 0..20u64 {
            let r = 0.008 + 0.02 * gaussian(3, 5, i);
            returns.push(r);
            smoother.update(r);
        }
        for i in 20..420u64 {
            let r = smoother.mean() + smoother.std() * gaussian(3, 5, i);
            returns.push(r);
            smoother.update(r);
        }

        let burn_in = returns.len() / 5;
        let at_d0 = log_likelihood(&returns, d0, burn_in);
        assert!(at_d0.is_finite());
        assert!(at_d0 > log_likelihood(&returns, 0.5, burn_in));
        assert!(at_d0 > log_likelihood(&returns, 0.99, burn_in));

        let fit = golden_section_max(
            |d| log_likelihood(&returns, d, burn_in),
            0.6,
            0.99,
            &folio_math::SolverConfig::default(),
        )
        .unwrap();
        assert!(
            (fit.argmax - d0).abs() < 0.05,
            "fitted {} vs generating {}",
            fit.argmax,
            d0
        );
    }
}
