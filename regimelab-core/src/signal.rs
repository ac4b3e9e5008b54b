//! Binary trade/no-trade signal from cluster membership.
//!
//! A cluster is "good" when its historical members were frequent, positive
//! and consistent enough. A date trades iff its cluster is good, its RSI is
//! strictly between the bounds, and its volatility is at most a multiple of
//! the window's average volatility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterStats;
use crate::error::CoreError;
use crate::features::{Feature, FeatureMatrix};
use crate::metrics::mean_f64;

/// Thresholds for cluster selection and per-date filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRules {
    pub min_cluster_size: usize,
    pub min_sharpe: f64,
    pub min_mean_return: f64,
    pub min_win_rate: f64,
    pub rsi_lower: f64,
    pub rsi_upper: f64,
    pub max_vol_multiple: f64,
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            min_cluster_size: 5,
            min_sharpe: 0.2,
            min_mean_return: 0.0,
            min_win_rate: 0.45,
            rsi_lower: 30.0,
            rsi_upper: 70.0,
            max_vol_multiple: 1.5,
        }
    }
}

impl SignalRules {
    pub fn is_good_cluster(&self, stats: &ClusterStats) -> bool {
        stats.size >= self.min_cluster_size
            && stats.sharpe > self.min_sharpe
            && stats.mean_return > self.min_mean_return
            && stats.win_rate > self.min_win_rate
    }
}

/// Good-cluster test with the default thresholds.
pub fn is_good_cluster(stats: &ClusterStats) -> bool {
    SignalRules::default().is_good_cluster(stats)
}

/// Per-date signal values (0 or 1) aligned with the feature rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSeries {
    dates: Vec<NaiveDate>,
    values: Vec<u8>,
}

impl SignalSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<u8>) -> Result<Self, CoreError> {
        if dates.len() != values.len() {
            return Err(CoreError::InvalidParameter(format!(
                "{} dates for {} signal values",
                dates.len(),
                values.len()
            )));
        }
        if values.iter().any(|&v| v > 1) {
            return Err(CoreError::InvalidParameter("signal values must be 0 or 1".into()));
        }
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Signal on the last date, 0 for an empty series.
    pub fn current(&self) -> u8 {
        self.values.last().copied().unwrap_or(0)
    }

    pub fn trade_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u8)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Turns cluster labels into a [`SignalSeries`].
#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    rules: SignalRules,
}

impl SignalGenerator {
    pub fn new(rules: SignalRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SignalRules {
        &self.rules
    }

    /// Ids of the clusters that pass the good-cluster test.
    pub fn good_clusters(&self, stats: &[ClusterStats]) -> Vec<usize> {
        stats
            .iter()
            .enumerate()
            .filter(|(_, s)| self.rules.is_good_cluster(s))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn generate(
        &self,
        labels: &[usize],
        stats: &[ClusterStats],
        features: &FeatureMatrix,
    ) -> Result<SignalSeries, CoreError> {
        if labels.len() != features.len() {
            return Err(CoreError::InvalidParameter(format!(
                "{} labels for {} feature rows",
                labels.len(),
                features.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= stats.len()) {
            return Err(CoreError::InvalidParameter(format!(
                "label {bad} has no cluster statistics"
            )));
        }

        let good: Vec<bool> = stats.iter().map(|s| self.rules.is_good_cluster(s)).collect();
        let rsi = features.column(Feature::Rsi);
        let vol = features.column(Feature::Vol);
        let vol_cap = self.rules.max_vol_multiple * mean_f64(&vol);

        let values = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let trade = good[label]
                    && rsi[i] > self.rules.rsi_lower
                    && rsi[i] < self.rules.rsi_upper
                    && vol[i] <= vol_cap;
                u8::from(trade)
            })
            .collect();

        SignalSeries::new(features.dates().to_vec(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;

    fn stats(mean_return: f64, sharpe: f64, size: usize, win_rate: f64) -> ClusterStats {
        ClusterStats {
            mean_return,
            sharpe,
            size,
            win_rate,
        }
    }

    fn features(rsi: &[f64], vol: &[f64]) -> FeatureMatrix {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let dates = (0..rsi.len())
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        let rows = rsi
            .iter()
            .zip(vol)
            .map(|(&r, &v)| {
                let mut row = [0.0; FEATURE_COUNT];
                row[Feature::Rsi.index()] = r;
                row[Feature::Vol.index()] = v;
                row
            })
            .collect();
        FeatureMatrix::new(dates, rows).unwrap()
    }

    #[test]
    fn good_cluster_thresholds_are_strict() {
        assert!(is_good_cluster(&stats(0.001, 0.3, 5, 0.5)));
        assert!(!is_good_cluster(&stats(0.001, 0.3, 4, 0.5)));
        assert!(!is_good_cluster(&stats(0.001, 0.2, 5, 0.5)));
        assert!(!is_good_cluster(&stats(0.0, 0.3, 5, 0.5)));
        assert!(!is_good_cluster(&stats(0.001, 0.3, 5, 0.45)));
    }

    #[test]
    fn signal_requires_good_cluster_and_filters() {
        let cluster_stats = vec![stats(0.01, 0.5, 10, 0.6), stats(-0.01, -0.5, 10, 0.3)];
        // mean vol = 1.0 → cap 1.5
        let f = features(&[50.0, 50.0, 30.0, 69.9, 50.0], &[1.0, 1.0, 1.0, 0.5, 1.5]);
        let labels = [0, 1, 0, 0, 0];
        let signal = SignalGenerator::default()
            .generate(&labels, &cluster_stats, &f)
            .unwrap();
        assert_eq!(signal.values(), &[1, 0, 0, 1, 1]);
        assert_eq!(signal.len(), f.len());
        assert_eq!(signal.current(), 1);
        assert_eq!(signal.trade_count(), 3);
    }

    #[test]
    fn high_volatility_blocks_trade() {
        let cluster_stats = vec![stats(0.01, 0.5, 10, 0.6)];
        // mean vol = 2.0 → cap 3.0
        let f = features(&[50.0, 50.0, 50.0], &[0.5, 2.0, 3.5]);
        let signal = SignalGenerator::default()
            .generate(&[0, 0, 0], &cluster_stats, &f)
            .unwrap();
        assert_eq!(signal.values(), &[1, 1, 0]);
    }

    #[test]
    fn label_length_mismatch_is_rejected() {
        let f = features(&[50.0, 50.0], &[1.0, 1.0]);
        let err = SignalGenerator::default()
            .generate(&[0], &[stats(0.01, 0.5, 10, 0.6)], &f)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter(_)));
    }

    #[test]
    fn good_clusters_lists_ids() {
        let generator = SignalGenerator::default();
        let ids = generator.good_clusters(&[
            stats(-0.01, 0.5, 10, 0.6),
            stats(0.01, 0.5, 10, 0.6),
        ]);
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn signal_series_rejects_non_binary_values() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(SignalSeries::new(vec![d], vec![2]).is_err());
        assert_eq!(SignalSeries::new(vec![], vec![]).unwrap().current(), 0);
    }
}
