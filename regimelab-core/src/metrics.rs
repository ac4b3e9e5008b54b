//! Strategy and buy-and-hold performance metrics.
//!
//! All functions are pure. Degenerate ratios resolve to 0 through
//! [`checked_ratio`]; nothing here returns NaN or ±inf.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::checked_ratio;
use crate::indicators::TRADING_DAYS_PER_YEAR;

/// Average days per calendar year used to annualize compounded returns.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Outcome label for a strategy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "HOLD — no trading signals")]
    Hold,
}

impl StrategyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyStatus::Active => "ACTIVE",
            StrategyStatus::Hold => "HOLD — no trading signals",
        }
    }
}

/// Metrics over the days the strategy is in the market (signal == 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub sharpe_ratio: f64,
    pub annual_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub status: StrategyStatus,
}

impl StrategyMetrics {
    /// Sentinel result for a window without a single trading signal.
    pub fn no_trades() -> Self {
        Self {
            sharpe_ratio: 0.0,
            annual_return: 0.0,
            win_rate: 0.0,
            max_drawdown: 0.0,
            total_trades: 0,
            winning_trades: 0,
            status: StrategyStatus::Hold,
        }
    }

    /// Evaluate a signal against realized returns.
    ///
    /// `signal`, `returns` and `dates` are aligned 1:1. The annualization
    /// span is the calendar distance between the first and last date.
    pub fn compute(signal: &[u8], returns: &[f64], dates: &[NaiveDate]) -> Self {
        let traded = masked_returns(signal, returns);
        if traded.is_empty() {
            return Self::no_trades();
        }

        let total_days = returns.len();
        let trades = traded.len();
        let winning_trades = traded.iter().filter(|&&r| r > 0.0).count();

        let span_days = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*last - *first).num_days() as f64,
            _ => 0.0,
        };

        Self {
            sharpe_ratio: strategy_sharpe(&traded, total_days),
            annual_return: annualized_return(&traded, span_days / DAYS_PER_YEAR),
            win_rate: winning_trades as f64 / trades as f64,
            max_drawdown: max_drawdown(&wealth_curve(&traded)),
            total_trades: trades,
            winning_trades,
            status: StrategyStatus::Active,
        }
    }
}

/// Buy-and-hold metrics over every daily return in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub accuracy: f64,
    pub sharpe_ratio: f64,
    pub annual_return: f64,
}

impl BaselineMetrics {
    pub fn compute(returns: &[f64]) -> Self {
        if returns.len() < 2 {
            return Self {
                accuracy: 0.0,
                sharpe_ratio: 0.0,
                annual_return: 0.0,
            };
        }
        let mean = mean_f64(returns);
        let sharpe = checked_ratio("baseline_sharpe", mean, std_dev(returns))
            .map(|r| r * TRADING_DAYS_PER_YEAR.sqrt())
            .unwrap_or(0.0);
        let annual = (1.0 + mean).powf(TRADING_DAYS_PER_YEAR) - 1.0;

        Self {
            accuracy: returns.iter().filter(|&&r| r > 0.0).count() as f64 / returns.len() as f64,
            sharpe_ratio: sharpe,
            annual_return: if annual.is_finite() { annual } else { 0.0 },
        }
    }
}

/// Returns on the days the signal is 1, in date order.
pub fn masked_returns(signal: &[u8], returns: &[f64]) -> Vec<f64> {
    signal
        .iter()
        .zip(returns)
        .filter(|(&s, _)| s == 1)
        .map(|(_, &r)| r)
        .collect()
}

/// Sharpe of the traded returns, annualized by the fraction of days traded:
/// `mean / std × √(252 × trades / total_days)`. Zero with one trade or less,
/// or when the traded returns have no dispersion.
pub fn strategy_sharpe(traded: &[f64], total_days: usize) -> f64 {
    if traded.len() <= 1 || total_days == 0 {
        return 0.0;
    }
    let scale = (TRADING_DAYS_PER_YEAR * traded.len() as f64 / total_days as f64).sqrt();
    checked_ratio("strategy_sharpe", mean_f64(traded), std_dev(traded))
        .map(|r| r * scale)
        .unwrap_or(0.0)
}

/// Compound the traded returns and annualize over `years`.
///
/// Zero when the span is not positive; -1 when compounded wealth is wiped out.
pub fn annualized_return(traded: &[f64], years: f64) -> f64 {
    if years <= 0.0 || !years.is_finite() {
        return 0.0;
    }
    let wealth: f64 = traded.iter().map(|r| 1.0 + r).product();
    if wealth <= 0.0 {
        return -1.0;
    }
    let annual = wealth.powf(1.0 / years) - 1.0;
    if annual.is_finite() {
        annual
    } else {
        0.0
    }
}

/// Compounded wealth after each return, from an initial 1.0 that is not
/// itself part of the curve.
pub fn wealth_curve(returns: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len());
    let mut wealth = 1.0;
    for r in returns {
        wealth *= 1.0 + r;
        curve.push(wealth);
    }
    curve
}

/// Maximum drawdown as a negative fraction (e.g. -0.25 = 25% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 with fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation; 0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
