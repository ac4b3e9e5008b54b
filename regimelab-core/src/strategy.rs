//! Strategy contract and the cluster-regime strategy.
//!
//! A strategy is trained on a feature window, then predicts a signal and
//! evaluates it against the realized `return_1d` column. New strategies are
//! new [`TradingStrategy`] implementations.

use crate::cluster::ClusterModel;
use crate::error::CoreError;
use crate::features::FeatureMatrix;
use crate::metrics::{BaselineMetrics, StrategyMetrics};
use crate::signal::{SignalGenerator, SignalSeries};

/// Signal plus its scoring for one feature window.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEvaluation {
    pub signal: SignalSeries,
    pub metrics: StrategyMetrics,
    pub baseline: BaselineMetrics,
}

pub trait TradingStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn train(&mut self, features: &FeatureMatrix) -> Result<(), CoreError>;

    /// Fails with [`CoreError::NotTrained`] before [`train`](Self::train).
    fn predict(&self, features: &FeatureMatrix) -> Result<SignalSeries, CoreError>;

    /// Predict, then score the signal and the buy-and-hold baseline.
    fn evaluate(&self, features: &FeatureMatrix) -> Result<StrategyEvaluation, CoreError> {
        let signal = self.predict(features)?;
        let returns = features.returns();
        let metrics = StrategyMetrics::compute(signal.values(), &returns, features.dates());
        let baseline = BaselineMetrics::compute(&returns);
        Ok(StrategyEvaluation {
            signal,
            metrics,
            baseline,
        })
    }
}

/// Trades the days whose k-means regime has a favourable history.
#[derive(Debug, Clone)]
pub struct ClusterStrategy {
    n_clusters: usize,
    seed: u64,
    generator: SignalGenerator,
    trained: Option<Trained>,
}

#[derive(Debug, Clone)]
struct Trained {
    model: ClusterModel,
    dates: Vec<chrono::NaiveDate>,
}

impl ClusterStrategy {
    pub fn new(n_clusters: usize, seed: u64) -> Self {
        Self {
            n_clusters,
            seed,
            generator: SignalGenerator::default(),
            trained: None,
        }
    }

    pub fn with_generator(mut self, generator: SignalGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn model(&self) -> Option<&ClusterModel> {
        self.trained.as_ref().map(|t| &t.model)
    }

    /// Consume the strategy, returning the trained model if any.
    pub fn into_model(self) -> Option<ClusterModel> {
        self.trained.map(|t| t.model)
    }
}

impl TradingStrategy for ClusterStrategy {
    fn name(&self) -> &str {
        "cluster_regime"
    }

    fn train(&mut self, features: &FeatureMatrix) -> Result<(), CoreError> {
        let model = ClusterModel::train(features, self.n_clusters, self.seed)?;
        self.trained = Some(Trained {
            model,
            dates: features.dates().to_vec(),
        });
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<SignalSeries, CoreError> {
        let trained = self.trained.as_ref().ok_or(CoreError::NotTrained)?;
        // The training window keeps its fitted labels; other rows are
        // assigned to the nearest centroid.
        let labels = if features.dates() == trained.dates.as_slice() {
            trained.model.labels().to_vec()
        } else {
            trained.model.assign(features)
        };
        self.generator
            .generate(&labels, trained.model.stats(), features)
    }
}
