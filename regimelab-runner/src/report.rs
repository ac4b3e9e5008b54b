//! Output payloads and the boundary sanitization step.
//!
//! Every float leaving the pipeline is finite. Metric fields map NaN/±inf to
//! 0; optional fields (feature statistics, indicator values) map them to
//! `None`, which serializes as `null`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use regimelab_core::cluster::ClusterStats;
use regimelab_core::domain::PriceSeries;
use regimelab_core::features::{Feature, FeatureMatrix};
use regimelab_core::indicators::engine::{
    DEFAULT_RSI_WINDOW, DEFAULT_SMA_WINDOW, DEFAULT_VOLATILITY_WINDOW,
};
use regimelab_core::indicators::IndicatorEngine;
use regimelab_core::metrics::{BaselineMetrics, StrategyMetrics};

use crate::search::SearchOutcome;

/// Metric value at the boundary: non-finite becomes 0.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Optional value at the boundary: non-finite becomes `None`.
pub fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub signal: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub mean_return: f64,
    pub sharpe: f64,
    pub size: usize,
    pub win_rate: f64,
}

impl From<&ClusterStats> for ClusterSummary {
    fn from(stats: &ClusterStats) -> Self {
        Self {
            mean_return: finite_or_zero(stats.mean_return),
            sharpe: finite_or_zero(stats.sharpe),
            size: stats.size,
            win_rate: finite_or_zero(stats.win_rate),
        }
    }
}

/// Descriptive statistics for one feature column.
///
/// Sample standard deviation; quantiles are linearly interpolated between
/// the closest ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl FeatureStats {
    pub fn describe(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();

        let mean = if n > 0 {
            sorted.iter().sum::<f64>() / n as f64
        } else {
            f64::NAN
        };
        let std = if n > 1 {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            f64::NAN
        };

        Self {
            count: n,
            mean: finite_or_none(mean),
            std: finite_or_none(std),
            min: sorted.first().copied(),
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    finite_or_none(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// `describe()` for every feature column, keyed by feature name.
pub fn feature_stats(features: &FeatureMatrix) -> BTreeMap<String, FeatureStats> {
    Feature::ALL
        .iter()
        .map(|&f| (f.name().to_string(), FeatureStats::describe(&features.column(f))))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub attempt: usize,
    pub seed: u64,
    pub score: f64,
    pub valid_attempts: usize,
    pub total_attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
}

/// Complete result of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub signals: Vec<SignalPoint>,
    pub current_signal: u8,
    pub strategy_metrics: StrategyMetrics,
    pub baseline_metrics: BaselineMetrics,
    pub clusters: BTreeMap<usize, ClusterSummary>,
    pub feature_stats: BTreeMap<String, FeatureStats>,
    pub selection: SelectionSummary,
    pub period: PeriodSummary,
}

impl AnalysisReport {
    /// Assemble and sanitize the payload for a finished search.
    pub fn build(
        features: &FeatureMatrix,
        outcome: &SearchOutcome,
        baseline: &BaselineMetrics,
    ) -> Self {
        let best = &outcome.best;
        let signals = best
            .signal
            .iter()
            .map(|(date, signal)| SignalPoint { date, signal })
            .collect();
        let clusters = best
            .model
            .stats()
            .iter()
            .enumerate()
            .map(|(id, stats)| (id, ClusterSummary::from(stats)))
            .collect();
        let (start, end) = match (features.first_date(), features.last_date()) {
            (Some(s), Some(e)) => (s, e),
            _ => (NaiveDate::MIN, NaiveDate::MIN),
        };

        Self {
            signals,
            current_signal: best.signal.current(),
            strategy_metrics: sanitize_strategy(&best.metrics),
            baseline_metrics: sanitize_baseline(baseline),
            clusters,
            feature_stats: feature_stats(features),
            selection: SelectionSummary {
                attempt: best.attempt,
                seed: best.seed,
                score: finite_or_zero(best.score),
                valid_attempts: outcome.valid_attempts,
                total_attempts: outcome.total_attempts,
            },
            period: PeriodSummary {
                start,
                end,
                rows: features.len(),
            },
        }
    }
}

fn sanitize_strategy(metrics: &StrategyMetrics) -> StrategyMetrics {
    StrategyMetrics {
        sharpe_ratio: finite_or_zero(metrics.sharpe_ratio),
        annual_return: finite_or_zero(metrics.annual_return),
        win_rate: finite_or_zero(metrics.win_rate),
        max_drawdown: finite_or_zero(metrics.max_drawdown),
        ..metrics.clone()
    }
}

fn sanitize_baseline(metrics: &BaselineMetrics) -> BaselineMetrics {
    BaselineMetrics {
        accuracy: finite_or_zero(metrics.accuracy),
        sharpe_ratio: finite_or_zero(metrics.sharpe_ratio),
        annual_return: finite_or_zero(metrics.annual_return),
    }
}

/// Indicator values for one date; undefined values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_pct_b: Option<f64>,
    pub bb_bandwidth: Option<f64>,
    pub volatility: Option<f64>,
}

/// SMA(20), RSI(14), Bollinger(20, 2) and annualized volatility(252) per
/// date, computed over the full history and trimmed to the requested start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub rows: Vec<IndicatorRow>,
    pub current_volatility: Option<f64>,
}

impl IndicatorReport {
    pub fn build(series: &PriceSeries, start: Option<NaiveDate>) -> Self {
        let set = IndicatorEngine::new(series).indicator_set();
        let sma_key = format!("sma_{DEFAULT_SMA_WINDOW}");
        let rsi_key = format!("rsi_{DEFAULT_RSI_WINDOW}");
        let vol_key = format!("volatility_{DEFAULT_VOLATILITY_WINDOW}");
        let value = |name: &str, i: usize| set.get(name, i).and_then(finite_or_none);

        let rows = series
            .bars()
            .iter()
            .enumerate()
            .filter(|(_, bar)| start.map_or(true, |s| bar.date >= s))
            .map(|(i, bar)| IndicatorRow {
                date: bar.date,
                sma: value(&sma_key, i),
                rsi: value(&rsi_key, i),
                bb_upper: value("bb_upper", i),
                bb_middle: value("bb_middle", i),
                bb_lower: value("bb_lower", i),
                bb_pct_b: value("bb_pct_b", i),
                bb_bandwidth: value("bb_bandwidth", i),
                volatility: value(&vol_key, i),
            })
            .collect();

        Self {
            rows,
            current_volatility: value(&vol_key, series.len() - 1),
        }
    }
}
