//! Serializable analysis configuration.
//!
//! Loaded from TOML or assembled from CLI flags. Every field has a default,
//! so a config file only needs the values it changes:
//!
//! ```toml
//! n_clusters = 4
//! lookback_window = 126
//! start_date = "2023-01-03"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regimelab_core::cluster::{MAX_CLUSTERS, MIN_CLUSTERS};
use regimelab_core::rng::{SeedHierarchy, SeedPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_CLUSTER_SIZE_FLOOR: usize = 3;
pub const MIN_LOOKBACK_WINDOW: usize = 60;
pub const MAX_ATTEMPTS_CEILING: usize = 100;

/// Errors from loading or validating an [`AnalysisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} out of range: {message}")]
    OutOfRange {
        field: &'static str,
        message: String,
    },
}

/// Parameters for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Number of regimes (2–10).
    pub n_clusters: usize,
    /// Smallest admissible cluster for an attempt to count as valid.
    pub min_cluster_size: usize,
    /// Calendar days of history fed to the indicators ahead of `start_date`.
    pub lookback_window: usize,
    /// Clustering attempts in the multi-start search.
    pub max_attempts: usize,
    /// Master seed for every attempt.
    pub seed: u64,
    pub seed_policy: SeedPolicy,
    /// Run search attempts on the rayon pool.
    pub parallel: bool,
    /// First date of the analysis window (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Last date of the analysis window (inclusive).
    pub end_date: Option<NaiveDate>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            min_cluster_size: 5,
            lookback_window: 252,
            max_attempts: 20,
            seed: 42,
            seed_policy: SeedPolicy::PerAttempt,
            parallel: true,
            start_date: None,
            end_date: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Fail fast on out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&self.n_clusters) {
            return Err(out_of_range(
                "n_clusters",
                format!(
                    "must be between {MIN_CLUSTERS} and {MAX_CLUSTERS}, got {}",
                    self.n_clusters
                ),
            ));
        }
        if self.min_cluster_size < MIN_CLUSTER_SIZE_FLOOR {
            return Err(out_of_range(
                "min_cluster_size",
                format!(
                    "must be at least {MIN_CLUSTER_SIZE_FLOOR}, got {}",
                    self.min_cluster_size
                ),
            ));
        }
        if self.lookback_window < MIN_LOOKBACK_WINDOW {
            return Err(out_of_range(
                "lookback_window",
                format!(
                    "must be at least {MIN_LOOKBACK_WINDOW}, got {}",
                    self.lookback_window
                ),
            ));
        }
        if !(1..=MAX_ATTEMPTS_CEILING).contains(&self.max_attempts) {
            return Err(out_of_range(
                "max_attempts",
                format!(
                    "must be between 1 and {MAX_ATTEMPTS_CEILING}, got {}",
                    self.max_attempts
                ),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(out_of_range(
                    "start_date",
                    format!("{start} is after end_date {end}"),
                ));
            }
        }
        Ok(())
    }

    pub fn seed_hierarchy(&self) -> SeedHierarchy {
        SeedHierarchy::new(self.seed, self.seed_policy)
    }
}

fn out_of_range(field: &'static str, message: String) -> ConfigError {
    ConfigError::OutOfRange { field, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.n_clusters, 5);
        assert_eq!(config.min_cluster_size, 5);
        assert_eq!(config.lookback_window, 252);
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.seed, 42);
        assert_eq!(config.seed_policy, SeedPolicy::PerAttempt);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            n_clusters = 3
            seed_policy = "fixed"
            start_date = "2024-01-02"
            "#,
        )
        .unwrap();
        assert_eq!(config.n_clusters, 3);
        assert_eq!(config.seed_policy, SeedPolicy::Fixed);
        assert_eq!(
            config.start_date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(config.lookback_window, 252);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AnalysisConfig::from_toml_str("clusters = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let cases = [
            ("n_clusters = 1", "n_clusters"),
            ("n_clusters = 11", "n_clusters"),
            ("min_cluster_size = 2", "min_cluster_size"),
            ("lookback_window = 59", "lookback_window"),
            ("max_attempts = 0", "max_attempts"),
            ("max_attempts = 101", "max_attempts"),
        ];
        for (text, expected) in cases {
            match AnalysisConfig::from_toml_str(text) {
                Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, expected),
                other => panic!("{text}: expected OutOfRange, got {other:?}"),
            }
        }
    }

    #[test]
    fn inverted_dates_fail_validation() {
        let config = AnalysisConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "start_date", .. })
        ));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, "n_clusters = 4\nparallel = false\n").unwrap();
        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.n_clusters, 4);
        assert!(!config.parallel);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AnalysisConfig::from_file("/nonexistent/analysis.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
