//! Multi-start regime search.
//!
//! k-means is sensitive to its initialization, so the search trains up to
//! `max_attempts` models from independently derived seeds and keeps the
//! best valid one. An attempt is valid when every cluster has at least
//! `min_cluster_size` members; its score is the strategy Sharpe of its
//! signal minus the population standard deviation of its cluster sizes.
//!
//! Attempts run in parallel (rayon) or sequentially. Outcomes are always
//! collected in attempt order before selection, so both modes pick the same
//! attempt.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use regimelab_core::cluster::ClusterModel;
use regimelab_core::features::{FeatureMatrix, MIN_FEATURE_ROWS};
use regimelab_core::metrics::{population_std, StrategyMetrics};
use regimelab_core::rng::SeedHierarchy;
use regimelab_core::signal::SignalSeries;
use regimelab_core::strategy::{ClusterStrategy, TradingStrategy};
use regimelab_core::CoreError;

use crate::runner::PipelineStage;

/// Rows a window needs before the search is attempted at all.
pub fn required_rows(n_clusters: usize, min_cluster_size: usize) -> usize {
    MIN_FEATURE_ROWS.max(n_clusters * min_cluster_size)
}

/// Search parameters.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub n_clusters: usize,
    pub min_cluster_size: usize,
    pub max_attempts: usize,
    pub seeds: SeedHierarchy,
    pub parallel: bool,
}

/// One valid, scored clustering attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub attempt: usize,
    pub seed: u64,
    pub model: ClusterModel,
    pub signal: SignalSeries,
    pub metrics: StrategyMetrics,
    pub score: f64,
}

/// The selected attempt and how many attempts were admissible.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: StrategyAttempt,
    pub valid_attempts: usize,
    pub total_attempts: usize,
}

/// Composite attempt score: strategy Sharpe minus cluster-size imbalance.
pub fn attempt_score(strategy_sharpe: f64, sizes: &[usize]) -> f64 {
    let sizes: Vec<f64> = sizes.iter().map(|&s| s as f64).collect();
    strategy_sharpe - population_std(&sizes)
}

/// Index of the strictly highest score; ties keep the earliest index.
pub fn best_index(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Run the search over a feature window.
pub fn search(features: &FeatureMatrix, params: &SearchParams) -> Result<SearchOutcome, CoreError> {
    search_with_stages(features, params, |_| {})
}

/// Run the search, calling `on_stage` as each phase completes: every
/// attempt trained (CLUSTERED), admissible attempts kept (VALIDATED),
/// admissible attempts scored (SCORED), best attempt chosen (SELECTED).
pub fn search_with_stages<F>(
    features: &FeatureMatrix,
    params: &SearchParams,
    mut on_stage: F,
) -> Result<SearchOutcome, CoreError>
where
    F: FnMut(PipelineStage),
{
    let required = required_rows(params.n_clusters, params.min_cluster_size);
    if features.len() < required {
        return Err(CoreError::InsufficientData {
            rows: features.len(),
            required,
        });
    }

    let attempts: Vec<usize> = (0..params.max_attempts).collect();
    let trained = map_in_order(attempts, params.parallel, |attempt| {
        let mut strategy = ClusterStrategy::new(params.n_clusters, params.seeds.attempt_seed(attempt));
        strategy.train(features)?;
        Ok((attempt, strategy))
    })?;
    on_stage(PipelineStage::Clustered);

    let admissible: Vec<(usize, ClusterStrategy)> = trained
        .into_iter()
        .filter(|(attempt, strategy)| is_admissible(*attempt, strategy, params.min_cluster_size))
        .collect();
    let valid_attempts = admissible.len();
    if admissible.is_empty() {
        warn!(
            attempts = params.max_attempts,
            min_cluster_size = params.min_cluster_size,
            "no clustering attempt satisfied the minimum cluster size"
        );
        return Err(CoreError::NoValidClustering {
            attempts: params.max_attempts,
            min_cluster_size: params.min_cluster_size,
        });
    }
    on_stage(PipelineStage::Validated);

    let mut scored = map_in_order(admissible, params.parallel, |(attempt, strategy)| {
        score_attempt(features, params, attempt, strategy)
    })?;
    on_stage(PipelineStage::Scored);

    let scores: Vec<f64> = scored.iter().map(|a| a.score).collect();
    let index = best_index(&scores).ok_or(CoreError::NoValidClustering {
        attempts: params.max_attempts,
        min_cluster_size: params.min_cluster_size,
    })?;
    let best = scored.swap_remove(index);
    info!(
        attempt = best.attempt,
        seed = best.seed,
        score = best.score,
        valid_attempts,
        total_attempts = params.max_attempts,
        "selected clustering attempt"
    );
    on_stage(PipelineStage::Selected);

    Ok(SearchOutcome {
        best,
        valid_attempts,
        total_attempts: params.max_attempts,
    })
}

/// Apply `f` to every item on the rayon pool or in sequence; results keep
/// the input order either way.
fn map_in_order<T, U, F>(items: Vec<T>, parallel: bool, f: F) -> Result<Vec<U>, CoreError>
where
    T: Send,
    U: Send,
    F: Fn(T) -> Result<U, CoreError> + Sync + Send,
{
    if parallel {
        items.into_par_iter().map(f).collect()
    } else {
        items.into_iter().map(f).collect()
    }
}

fn is_admissible(attempt: usize, strategy: &ClusterStrategy, min_cluster_size: usize) -> bool {
    let sizes = strategy.model().map(ClusterModel::sizes).unwrap_or_default();
    let admissible = !sizes.is_empty() && sizes.iter().all(|&s| s >= min_cluster_size);
    if !admissible {
        debug!(attempt, ?sizes, "attempt rejected: cluster below minimum size");
    }
    admissible
}

fn score_attempt(
    features: &FeatureMatrix,
    params: &SearchParams,
    attempt: usize,
    strategy: ClusterStrategy,
) -> Result<StrategyAttempt, CoreError> {
    let seed = params.seeds.attempt_seed(attempt);
    let evaluation = strategy.evaluate(features)?;
    let model = strategy.into_model().ok_or(CoreError::NotTrained)?;
    let score = attempt_score(evaluation.metrics.sharpe_ratio, &model.sizes());
    debug!(
        attempt,
        seed,
        sharpe = evaluation.metrics.sharpe_ratio,
        score,
        "attempt scored"
    );

    Ok(StrategyAttempt {
        attempt,
        seed,
        model,
        signal: evaluation.signal,
        metrics: evaluation.metrics,
        score,
    })
}
