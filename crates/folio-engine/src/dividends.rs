//! After-tax real dividend-yield statistics.
//!
//! Dividends over a trailing window (5 years by default) are taxed,
//! deflated to the price level of the report month through the consumer
//! price index, bucketed into years anchored on the report month, and
//! turned into annual yield observations against the report-date price.
//!
//! The portfolio standard deviation is computed under an explicit **zero
//! cross-sectional correlation** assumption - there are fewer yearly
//! observations than positions, so a full covariance matrix would be
//! unidentifiable. Portfolio variance is the weight-squared sum of
//! position variances, and every beta/gradient identity downstream relies
//! on that regularization.

use crate::config::EngineConfig;
use crate::dates::{months_between, shift_months};
use crate::error::{EngineResult, Warning};
use crate::metrics::{marginal_gradient, MetricsProvider};
use crate::portfolio::Portfolio;
use crate::positions::PositionValues;
use folio_math::descriptive;
use folio_providers::IncomeDataProvider;

/// Annual after-tax real dividend-yield statistics for every position.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendMetrics {
    mean: PositionValues,
    std: PositionValues,
    beta: PositionValues,
    lower_bound: PositionValues,
    gradient: PositionValues,
    expected_income: f64,
    minimal_income: f64,
    warnings: Vec<Warning>,
}

impl DividendMetrics {
    /// Derives all dividend statistics for a portfolio.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::InvalidConfig`] for an
    /// out-of-range configuration; statistics themselves are total
    /// (a ticker that paid nothing simply yields zeros).
    pub fn compute(
        portfolio: &Portfolio,
        income: &impl IncomeDataProvider,
        config: &EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;

        let set = portfolio.positions();
        let report = portfolio.date();
        let years = config.dividend_years;
        let window_start = shift_months(report, -((years * 12) as i32));

        let cpi = income.price_index();
        let latest_index = cpi.at_or_before(report).map(|(_, level)| level);

        let size = set.len();
        let cash_idx = set.cash_index();
        let portfolio_idx = set.portfolio_index();
        let mut mean_v = vec![0.0; size];
        let mut std_v = vec![0.0; size];

        for (i, ticker) in set.tickers().iter().enumerate() {
            // Real after-tax dividends per year bucket, zeros included:
            // a year without payments is an observed zero, not a gap.
            let mut annual = vec![0.0; years];
            for (paid, amount) in income.dividend_series(ticker).between(window_start, report) {
                let bucket = (months_between(paid, report) / 12) as usize;
                if bucket >= years {
                    continue;
                }
                let deflator = match (latest_index, cpi.at_or_before(paid)) {
                    (Some(latest), Some((_, at_payment))) if at_payment > 0.0 => {
                        latest / at_payment
                    }
                    _ => 1.0,
                };
                annual[bucket] += amount * config.after_tax * deflator;
            }

            let price = portfolio.price().at(i);
            let yields: Vec<f64> = if price > 0.0 {
                annual.iter().map(|d| d / price).collect()
            } else {
                vec![0.0; years]
            };
            mean_v[i] = descriptive::mean(&yields)?;
            std_v[i] = descriptive::sample_std(&yields)?;
        }

        let weight = portfolio.weight();
        let mu_p: f64 = set
            .tickers()
            .iter()
            .enumerate()
            .map(|(i, _)| weight.at(i) * mean_v[i])
            .sum();
        let var_p: f64 = set
            .tickers()
            .iter()
            .enumerate()
            .map(|(i, _)| (weight.at(i) * std_v[i]).powi(2))
            .sum();
        let sigma_p = var_p.sqrt();
        mean_v[portfolio_idx] = mu_p;
        std_v[portfolio_idx] = sigma_p;

        let t = config.confidence;
        let mut beta_v = vec![0.0; size];
        let mut lower_v = vec![0.0; size];
        let mut gradient_v = vec![0.0; size];
        for i in 0..size {
            // Under zero cross-sectional correlation,
            // cov(y_i, y_p) = w_i * var_i, hence beta_i = w_i * var_i / var_p.
            beta_v[i] = if i == portfolio_idx {
                1.0
            } else if i == cash_idx || var_p == 0.0 {
                0.0
            } else {
                weight.at(i) * std_v[i].powi(2) / var_p
            };
            lower_v[i] = mean_v[i] - t * sigma_p * beta_v[i];
            gradient_v[i] = if var_p == 0.0 {
                0.0
            } else {
                marginal_gradient(t, mu_p, sigma_p, mean_v[i], beta_v[i])
            };
        }

        let total_value = portfolio.total_value();
        let expected_income = mu_p * total_value;
        let minimal_income = lower_v[portfolio_idx] * total_value;

        Ok(Self {
            mean: PositionValues::new(set, mean_v),
            std: PositionValues::new(set, std_v),
            beta: PositionValues::new(set, beta_v),
            lower_bound: PositionValues::new(set, lower_v),
            gradient: PositionValues::new(set, gradient_v),
            expected_income,
            minimal_income,
            warnings: Vec::new(),
        })
    }

    /// Mean annual after-tax real yield per position.
    #[must_use]
    pub fn mean(&self) -> &PositionValues {
        &self.mean
    }

    /// Sample standard deviation of the annual yields per position.
    #[must_use]
    pub fn std(&self) -> &PositionValues {
        &self.std
    }

    /// Beta against the portfolio yield under the zero-correlation model.
    #[must_use]
    pub fn beta(&self) -> &PositionValues {
        &self.beta
    }

    /// Beta-adjusted lower confidence bound `mean - t*std_p*beta`.
    #[must_use]
    pub fn lower_bound(&self) -> &PositionValues {
        &self.lower_bound
    }

    /// Marginal yield gradient per position.
    #[must_use]
    pub fn gradient(&self) -> &PositionValues {
        &self.gradient
    }

    /// Expected annual dividend income in currency units.
    #[must_use]
    pub fn expected_income(&self) -> f64 {
        self.expected_income
    }

    /// Lower-confidence annual dividend income in currency units.
    #[must_use]
    pub fn minimal_income(&self) -> f64 {
        self.minimal_income
    }

    /// Advisory conditions raised while estimating.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl MetricsProvider for DividendMetrics {
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

    /// One payment per year for the last five years, growing amounts.
    fn yearly_dividends(report: NaiveDate, base: f64, step: f64) -> DateSeries {
        let pairs: Vec<_> = (0..5)
            .map(|k| {
                (
                    shift_months(report, -(k * 12) - 2),
                    base + step * (4 - k) as f64,
                )
            })
            .collect();
        DateSeries::from_pairs(pairs).unwrap()
    }

    fn flat_cpi(report: NaiveDate) -> DateSeries {
        let pairs: Vec<_> = (0..=61)
            .map(|k| (shift_months(report, -k), 100.0))
            .collect();
        DateSeries::from_pairs(pairs).unwrap()
    }

    fn test_market(report: NaiveDate) -> InMemoryProvider {
        InMemoryProvider::new()
            .with_prices(
                "A",
                DateSeries::from_pairs(vec![(report, 10.0)]).unwrap(),
            )
            .with_prices(
                "B",
                DateSeries::from_pairs(vec![(report, 20.0)]).unwrap(),
            )
            .with_dividends("A", yearly_dividends(report, 0.40, 0.02))
            .with_dividends("B", yearly_dividends(report, 1.00, 0.10))
            .with_price_index(flat_cpi(report))
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
    fn test_yield_mean_with_flat_cpi() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);
        let config = EngineConfig::default().with_after_tax(1.0);

        let metrics = DividendMetrics::compute(&portfolio, &market, &config).unwrap();

        // A paid 0.40..0.48 per share on a price of 10: yields 0.040..0.048
        assert_relative_eq!(metrics.mean().get("A").unwrap(), 0.044, epsilon = 1e-12);
        assert!(metrics.std().get("A").unwrap() > 0.0);
    }

    #[test]
    fn test_after_tax_scales_yields() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let gross = DividendMetrics::compute(
            &portfolio,
            &market,
            &EngineConfig::default().with_after_tax(1.0),
        )
        .unwrap();
        let net = DividendMetrics::compute(
            &portfolio,
            &market,
            &EngineConfig::default().with_after_tax(0.85),
        )
        .unwrap();

        assert_relative_eq!(
            net.mean().get("A").unwrap(),
            0.85 * gross.mean().get("A").unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_deflation_raises_old_payments() {
        let report = date(2025, 9, 19);
        // Index rises over time, so older payments deflate upward
        let rising: Vec<_> = (0..=61)
            .map(|k| (shift_months(report, -k), 100.0 - k as f64))
            .collect();
        let market = test_market(report).with_price_index(DateSeries::from_pairs(rising).unwrap());
        let portfolio = test_portfolio(report, &market);
        let config = EngineConfig::default().with_after_tax(1.0);

        let deflated = DividendMetrics::compute(&portfolio, &market, &config).unwrap();
        let flat = DividendMetrics::compute(
            &portfolio,
            &test_market(report),
            &config,
        )
        .unwrap();

        assert!(deflated.mean().get("A").unwrap() > flat.mean().get("A").unwrap());
    }

    #[test]
    fn test_cash_and_portfolio_identities() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let metrics =
            DividendMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        assert_relative_eq!(metrics.mean().get(CASH).unwrap(), 0.0);
        assert_relative_eq!(metrics.std().get(CASH).unwrap(), 0.0);
        assert_relative_eq!(metrics.beta().get(CASH).unwrap(), 0.0);
        assert_relative_eq!(metrics.beta().get(PORTFOLIO).unwrap(), 1.0);

        // Weighted betas reproduce 1 under the zero-correlation model
        let weighted_beta: f64 = portfolio
            .positions()
            .tickers()
            .iter()
            .map(|t| {
                portfolio.weight().get(t).unwrap() * metrics.beta().get(t).unwrap()
            })
            .sum();
        assert_relative_eq!(weighted_beta, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weighted_gradient_sums_to_zero() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let metrics =
            DividendMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        let sum: f64 = portfolio
            .weight()
            .values()
            .iter()
            .zip(metrics.gradient().values())
            .take(portfolio.positions().len() - 1)
            .map(|(w, g)| w * g)
            .sum();
        assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lower_bound_is_beta_adjusted() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);
        let config = EngineConfig::default();

        let metrics = DividendMetrics::compute(&portfolio, &market, &config).unwrap();

        let sigma_p = metrics.std().get(PORTFOLIO).unwrap();
        for ticker in portfolio.positions().tickers() {
            let expected = metrics.mean().get(ticker).unwrap()
                - config.confidence * sigma_p * metrics.beta().get(ticker).unwrap();
            assert_relative_eq!(
                metrics.lower_bound().get(ticker).unwrap(),
                expected,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_income_scalars() {
        let report = date(2025, 9, 19);
        let market = test_market(report);
        let portfolio = test_portfolio(report, &market);

        let metrics =
            DividendMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        assert_relative_eq!(
            metrics.expected_income(),
            metrics.mean().get(PORTFOLIO).unwrap() * portfolio.total_value(),
            epsilon = 1e-12
        );
        assert!(metrics.minimal_income() <= metrics.expected_income());
    }

    #[test]
    fn test_no_dividends_is_all_zero() {
        let report = date(2025, 9, 19);
        let market = InMemoryProvider::new()
            .with_prices("A", DateSeries::from_pairs(vec![(report, 10.0)]).unwrap())
            .with_price_index(flat_cpi(report));
        let portfolio = Portfolio::builder(report)
            .cash(100.0)
            .holding("A", 10)
            .build(&market)
            .unwrap();

        let metrics =
            DividendMetrics::compute(&portfolio, &market, &EngineConfig::default()).unwrap();

        assert_relative_eq!(metrics.mean().get("A").unwrap(), 0.0);
        assert_relative_eq!(metrics.std().get(PORTFOLIO).unwrap(), 0.0);
        assert_relative_eq!(metrics.gradient().get("A").unwrap(), 0.0);
        assert_relative_eq!(metrics.expected_income(), 0.0);
    }
}
