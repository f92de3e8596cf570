//! The Pareto optimizer: dominance search and trade sizing.
//!
//! A position `j` dominates `i` when it is simultaneously better on both
//! the dividend-gradient and return-gradient axes and is liquid enough to
//! trade. The optimizer diagnoses the whole portfolio, scores the
//! aggregate improvement against the confidence multiplier, and - when a
//! dominated position exists - sizes one phased sell/buy trade pair.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, Warning};
use crate::metrics::MetricsProvider;
use crate::portfolio::Portfolio;
use folio_providers::MarketDataProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One leg of a proposed trade, split into clips for phased execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLeg {
    /// The ticker to trade.
    pub ticker: String,
    /// Total lots to trade.
    pub lots: u64,
    /// Lots per clip; clips sum to `lots`.
    pub clips: Vec<u64>,
    /// Estimated value of the whole leg at the report-date price.
    pub estimated_value: f64,
}

/// A concrete sell/buy pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    /// The leg reducing the dominated position.
    pub sell: TradeLeg,
    /// The leg building up the dominating position.
    pub buy: TradeLeg,
}

/// The optimizer's diagnosis and (optional) trade recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Dominating replacement per real ticker; empty string when none.
    pub dominated: BTreeMap<String, String>,
    /// Achievable improvement per real ticker; 0 when undominated.
    pub gradient_growth: BTreeMap<String, f64>,
    /// Aggregate improvement in portfolio-yield standard deviations.
    pub t_growth: f64,
    /// True when `t_growth` exceeds the confidence multiplier. Advisory
    /// text, not a gate on the trade proposal.
    pub rebalancing_warranted: bool,
    /// The proposed trade, or `None` when no actionable trade exists.
    pub trade: Option<TradeProposal>,
    /// Advisory conditions accumulated across the evaluation.
    pub warnings: Vec<Warning>,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "improvement score {:.2}: rebalancing {}",
            self.t_growth,
            if self.rebalancing_warranted {
                "statistically warranted"
            } else {
                "not warranted"
            }
        )?;
        for (ticker, dominator) in &self.dominated {
            if !dominator.is_empty() {
                writeln!(
                    f,
                    "  {ticker} dominated by {dominator} (growth {:.4})",
                    self.gradient_growth.get(ticker).copied().unwrap_or(0.0)
                )?;
            }
        }
        match &self.trade {
            Some(trade) => writeln!(
                f,
                "trade: sell {} lots of {} (clips {:?}), buy {} lots of {} (clips {:?})",
                trade.sell.lots,
                trade.sell.ticker,
                trade.sell.clips,
                trade.buy.lots,
                trade.buy.ticker,
                trade.buy.clips
            )?,
            None => writeln!(f, "no actionable trade")?,
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Evaluates the portfolio and proposes at most one rebalancing trade.
///
/// # Errors
///
/// - [`EngineError::NoHeldPositions`] when every real weight is zero
/// - [`EngineError::NonFiniteMetric`] when a statistic consumed for the
///   trade decision is NaN at the chosen positions
pub fn recommend(
    portfolio: &Portfolio,
    returns: &dyn MetricsProvider,
    dividends: &dyn MetricsProvider,
    market: &impl MarketDataProvider,
    config: &EngineConfig,
) -> EngineResult<Recommendation> {
    config.validate()?;

    let set = portfolio.positions();
    let tickers = set.tickers();
    let weight = portfolio.weight();
    let total_value = portfolio.total_value();

    if !tickers.iter().enumerate().any(|(i, _)| weight.at(i) > 0.0) {
        return Err(EngineError::NoHeldPositions);
    }

    let liquidity: Vec<f64> = tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| {
            liquidity_factor(
                ticker,
                portfolio.date(),
                portfolio.price().at(i),
                total_value,
                market,
                config,
            )
        })
        .collect();

    let div_grad = dividends.gradient();
    let ret_grad = returns.gradient();

    // Pareto dominance search over the real tickers
    let mut dominated = BTreeMap::new();
    let mut gradient_growth = BTreeMap::new();
    for (i, ticker) in tickers.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        if weight.at(i) > 0.0 {
            for (j, _) in tickers.iter().enumerate() {
                if j == i || liquidity[j] <= 0.0 {
                    continue;
                }
                if div_grad.at(j) > div_grad.at(i) && ret_grad.at(j) > ret_grad.at(i) {
                    let growth = (div_grad.at(j) - div_grad.at(i)) * liquidity[j];
                    if best.map_or(true, |(_, g)| growth > g) {
                        best = Some((j, growth));
                    }
                }
            }
        }
        match best {
            Some((j, growth)) => {
                dominated.insert(ticker.clone(), tickers[j].clone());
                gradient_growth.insert(ticker.clone(), growth);
            }
            None => {
                dominated.insert(ticker.clone(), String::new());
                gradient_growth.insert(ticker.clone(), 0.0);
            }
        }
    }

    let sigma_p = dividends.std().portfolio();
    let weighted_growth: f64 = tickers
        .iter()
        .enumerate()
        .map(|(i, t)| weight.at(i) * gradient_growth[t])
        .sum();
    let t_growth = if sigma_p > 0.0 {
        weighted_growth / sigma_p
    } else {
        0.0
    };
    let rebalancing_warranted = t_growth > config.confidence;

    let best_sell = tickers
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            gradient_growth[*a]
                .partial_cmp(&gradient_growth[*b])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, t)| (i, t.clone()));

    let trade = match best_sell {
        Some((sell_idx, sell_ticker)) if gradient_growth[&sell_ticker] > 0.0 => {
            let buy_ticker = dominated[&sell_ticker].clone();
            let buy_idx = set
                .index_of(&buy_ticker)
                .expect("dominator is a member of the position set");

            for &(idx, label) in &[(sell_idx, &sell_ticker), (buy_idx, &buy_ticker)] {
                if !div_grad.at(idx).is_finite() || !dividends.mean().at(idx).is_finite() {
                    return Err(EngineError::non_finite(label.clone(), "dividend gradient"));
                }
                if !ret_grad.at(idx).is_finite() || !returns.mean().at(idx).is_finite() {
                    return Err(EngineError::non_finite(label.clone(), "return gradient"));
                }
            }

            Some(size_trade(
                portfolio,
                sell_idx,
                &sell_ticker,
                buy_idx,
                &buy_ticker,
                config,
            ))
        }
        _ => None,
    };

    let mut warnings = portfolio.warnings().to_vec();
    warnings.extend_from_slice(returns.warnings());
    warnings.extend_from_slice(dividends.warnings());

    Ok(Recommendation {
        dominated,
        gradient_growth,
        t_growth,
        rebalancing_warranted,
        trade,
        warnings,
    })
}

/// Quadratic liquidity penalty: positions whose traded value share of the
/// portfolio is near or below the cutoff are effectively untradeable.
fn liquidity_factor(
    ticker: &str,
    report_date: chrono::NaiveDate,
    price: f64,
    total_value: f64,
    market: &impl MarketDataProvider,
    config: &EngineConfig,
) -> f64 {
    if total_value <= 0.0 || price <= 0.0 {
        return 0.0;
    }
    let Some((_, volume)) = market.volume_series(ticker).at_or_before(report_date) else {
        return 0.0;
    };
    let traded_share = volume * price / total_value;
    if traded_share <= 0.0 {
        return 0.0;
    }
    (1.0 - (config.liquidity_cutoff / traded_share).powi(2)).max(0.0)
}

/// Sizes the phased sell/buy pair for a dominated position.
fn size_trade(
    portfolio: &Portfolio,
    sell_idx: usize,
    sell_ticker: &str,
    buy_idx: usize,
    buy_ticker: &str,
    config: &EngineConfig,
) -> TradeProposal {
    let total_value = portfolio.total_value();
    let clips = config.trade_clips;

    let sell_lot_value = portfolio.price().at(sell_idx) * portfolio.lot_size().at(sell_idx);
    let sell_target = portfolio.weight().at(sell_idx).min(config.max_trade_fraction) * total_value;
    let held_lots = portfolio.lots()[sell_idx];
    let sell_lots = if sell_lot_value > 0.0 {
        ((sell_target / sell_lot_value).ceil() as u64).min(held_lots)
    } else {
        0
    };
    let sell_value = sell_lots as f64 * sell_lot_value;

    let buy_lot_value = portfolio.price().at(buy_idx) * portfolio.lot_size().at(buy_idx);
    let budget = portfolio.cash() + sell_value;
    let buy_lots = if buy_lot_value > 0.0 {
        (budget / buy_lot_value).floor() as u64
    } else {
        0
    };

    TradeProposal {
        sell: TradeLeg {
            ticker: sell_ticker.to_string(),
            lots: sell_lots,
            clips: split_clips(sell_lots, clips),
            estimated_value: sell_value,
        },
        buy: TradeLeg {
            ticker: buy_ticker.to_string(),
            lots: buy_lots,
            clips: split_clips(buy_lots, clips),
            estimated_value: buy_lots as f64 * buy_lot_value,
        },
    }
}

/// Splits lots into near-equal clips (the first clips absorb the remainder).
fn split_clips(lots: u64, clips: u32) -> Vec<u64> {
    let clips = u64::from(clips);
    let base = lots / clips;
    let remainder = lots % clips;
    (0..clips)
        .map(|k| if k < remainder { base + 1 } else { base })
        .collect()
}
