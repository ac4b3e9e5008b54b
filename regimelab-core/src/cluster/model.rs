//! A trained partition of feature rows into regimes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::kmeans::{kmeans, squared_distance, KMeansParams};
use super::scaler::StandardScaler;
use crate::error::{checked_ratio, CoreError};
use crate::features::{FeatureMatrix, FEATURE_COUNT};
use crate::metrics::{mean_f64, std_dev};
use crate::rng::seeded_rng;

pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 10;

/// Historical behaviour of one cluster's member days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub mean_return: f64,
    /// `mean / std` of member returns (sample std), 0 when undefined.
    pub sharpe: f64,
    pub size: usize,
    pub win_rate: f64,
}

impl ClusterStats {
    pub fn from_returns(returns: &[f64]) -> Self {
        if returns.is_empty() {
            return Self {
                mean_return: 0.0,
                sharpe: 0.0,
                size: 0,
                win_rate: 0.0,
            };
        }
        let mean = mean_f64(returns);
        Self {
            mean_return: mean,
            sharpe: checked_ratio("cluster_sharpe", mean, std_dev(returns)).unwrap_or(0.0),
            size: returns.len(),
            win_rate: returns.iter().filter(|&&r| r > 0.0).count() as f64 / returns.len() as f64,
        }
    }
}

/// k-means fit over standardized features plus per-cluster statistics.
///
/// Labels are aligned 1:1 with the feature rows and span exactly `0..k`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel {
    seed: u64,
    centroids: Vec<[f64; FEATURE_COUNT]>,
    labels: Vec<usize>,
    stats: Vec<ClusterStats>,
    scaler: StandardScaler<FEATURE_COUNT>,
}

impl ClusterModel {
    /// Standardize `features` on their own statistics and fit `n_clusters`
    /// clusters from `seed`.
    pub fn train(features: &FeatureMatrix, n_clusters: usize, seed: u64) -> Result<Self, CoreError> {
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&n_clusters) {
            return Err(CoreError::InvalidParameter(format!(
                "n_clusters must be between {MIN_CLUSTERS} and {MAX_CLUSTERS}, got {n_clusters}"
            )));
        }
        if features.is_empty() {
            return Err(CoreError::EmptyInput);
        }

        let scaler = StandardScaler::fit(features.rows());
        let standardized = scaler.transform(features.rows());

        let mut rng = seeded_rng(seed);
        let fit = kmeans(&standardized, KMeansParams::new(n_clusters), &mut rng)?;

        let returns = features.returns();
        let mut members: Vec<Vec<f64>> = vec![Vec::new(); n_clusters];
        for (&label, &r) in fit.labels.iter().zip(&returns) {
            members[label].push(r);
        }
        let stats: Vec<ClusterStats> = members.iter().map(|m| ClusterStats::from_returns(m)).collect();

        debug!(
            seed,
            n_clusters,
            iterations = fit.iterations,
            inertia = fit.inertia,
            "k-means fit complete"
        );

        Ok(Self {
            seed,
            centroids: fit.centroids,
            labels: fit.labels,
            stats,
            scaler,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Centroids in standardized feature space.
    pub fn centroids(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.centroids
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn stats(&self) -> &[ClusterStats] {
        &self.stats
    }

    pub fn scaler(&self) -> &StandardScaler<FEATURE_COUNT> {
        &self.scaler
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.stats.iter().map(|s| s.size).collect()
    }

    /// Nearest-centroid labels for new rows, standardized with the
    /// training statistics.
    pub fn assign(&self, features: &FeatureMatrix) -> Vec<usize> {
        self.scaler
            .transform(features.rows())
            .iter()
            .map(|row| {
                let mut best = 0;
                let mut best_dist = f64::INFINITY;
                for (c, centroid) in self.centroids.iter().enumerate() {
                    let d = squared_distance(row, centroid);
                    if d < best_dist {
                        best_dist = d;
                        best = c;
                    }
                }
                best
            })
            .collect()
    }

    /// True when every cluster has at least `min_cluster_size` members.
    pub fn is_valid(&self, min_cluster_size: usize) -> bool {
        self.stats.iter().all(|s| s.size >= min_cluster_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn matrix(n: usize) -> FeatureMatrix {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect();
        let rows = (0..n)
            .map(|i| {
                let regime = (i % 3) as f64;
                let mut row = [0.0; FEATURE_COUNT];
                row[0] = 0.01 * (regime - 1.0) + 0.0001 * (i % 7) as f64;
                row[1] = 0.2 + regime;
                row[3] = 40.0 + 10.0 * regime;
                row
            })
            .collect();
        FeatureMatrix::new(dates, rows).unwrap()
    }

    #[test]
    fn train_produces_k_labels() {
        let model = ClusterModel::train(&matrix(60), 3, 42).unwrap();
        assert_eq!(model.labels().len(), 60);
        assert_eq!(model.n_clusters(), 3);
        for c in 0..3 {
            assert!(model.labels().contains(&c));
        }
        assert_eq!(model.sizes().iter().sum::<usize>(), 60);
        assert!(model.is_valid(20));
        assert!(!model.is_valid(21));
    }

    #[test]
    fn train_is_deterministic() {
        let features = matrix(45);
        let a = ClusterModel::train(&features, 4, 9).unwrap();
        let b = ClusterModel::train(&features, 4, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn assign_matches_training_labels_on_separated_regimes() {
        let features = matrix(60);
        let model = ClusterModel::train(&features, 3, 42).unwrap();
        assert_eq!(model.assign(&features), model.labels());
    }

    #[test]
    fn out_of_range_cluster_count_is_rejected() {
        let features = matrix(30);
        assert!(matches!(
            ClusterModel::train(&features, 1, 0),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            ClusterModel::train(&features, 11, 0),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn cluster_stats_known_values() {
        let stats = ClusterStats::from_returns(&[0.01, 0.03, -0.01]);
        assert_eq!(stats.size, 3);
        assert!((stats.mean_return - 0.01).abs() < 1e-12);
        assert!((stats.sharpe - 0.01 / 0.02).abs() < 1e-9);
        assert!((stats.win_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn cluster_stats_zero_std_has_zero_sharpe() {
        let stats = ClusterStats::from_returns(&[0.02, 0.02]);
        assert_eq!(stats.sharpe, 0.0);
        let single = ClusterStats::from_returns(&[0.05]);
        assert_eq!(single.sharpe, 0.0);
    }
}
