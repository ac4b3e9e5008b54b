//! Analysis runner: wires features, search, evaluation and reporting.
//!
//! Entry points:
//! - `run_analysis()`: a validated price series + config → `AnalysisReport`.
//! - `run_analysis_frame()`: the same from a polars price table.
//! - `run_indicator_report()`: the indicator-only payload.
//!
//! The pipeline advances through [`PipelineStage`]s. Every transition is
//! logged at debug level, and a core failure is reported with the stage it
//! happened in.

use std::fmt;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use regimelab_core::data::dataframe_to_series;
use regimelab_core::domain::PriceSeries;
use regimelab_core::features::{FeatureBuilder, FeatureMatrix};
use regimelab_core::metrics::BaselineMetrics;
use regimelab_core::CoreError;

use crate::config::{AnalysisConfig, ConfigError};
use crate::data_loader::LoadError;
use crate::report::{AnalysisReport, IndicatorReport};
use crate::search::{search_with_stages, SearchOutcome, SearchParams};

/// Lifecycle of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Raw,
    FeaturesBuilt,
    Clustered,
    Validated,
    Scored,
    Selected,
    Signaled,
    Evaluated,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Raw => "RAW",
            PipelineStage::FeaturesBuilt => "FEATURES_BUILT",
            PipelineStage::Clustered => "CLUSTERED",
            PipelineStage::Validated => "VALIDATED",
            PipelineStage::Scored => "SCORED",
            PipelineStage::Selected => "SELECTED",
            PipelineStage::Signaled => "SIGNALED",
            PipelineStage::Evaluated => "EVALUATED",
        };
        f.write_str(name)
    }
}

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("analysis failed at {stage}: {source}")]
    Pipeline {
        stage: PipelineStage,
        #[source]
        source: CoreError,
    },
}

impl RunError {
    /// Stage a pipeline failure happened in, if it was one.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            RunError::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Underlying core error of a pipeline failure.
    pub fn core_error(&self) -> Option<&CoreError> {
        match self {
            RunError::Pipeline { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Tracks the current stage and tags failures with it.
struct Pipeline {
    stage: PipelineStage,
}

impl Pipeline {
    fn start() -> Self {
        debug!(stage = %PipelineStage::Raw, "pipeline stage");
        Self {
            stage: PipelineStage::Raw,
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        debug!(from = %self.stage, to = %stage, "pipeline stage");
        self.stage = stage;
    }

    fn fail(&self, stage: PipelineStage, source: CoreError) -> RunError {
        debug!(last_completed = %self.stage, failed = %stage, error = %source, "pipeline failed");
        RunError::Pipeline { stage, source }
    }
}

/// Run the full analysis on a validated price series.
pub fn run_analysis(series: &PriceSeries, config: &AnalysisConfig) -> Result<AnalysisReport, RunError> {
    config.validate()?;
    let mut pipeline = Pipeline::start();

    let features = build_features(series, config)
        .map_err(|e| pipeline.fail(PipelineStage::FeaturesBuilt, e))?;
    pipeline.advance(PipelineStage::FeaturesBuilt);

    let outcome = run_search(&features, config, |stage| pipeline.advance(stage))
        .map_err(|e| pipeline.fail(search_failure_stage(&e), e))?;

    // The selected attempt's signal was produced while scoring it.
    debug!(trades = outcome.best.signal.trade_count(), "selected signal");
    pipeline.advance(PipelineStage::Signaled);

    let baseline = BaselineMetrics::compute(&features.returns());
    let report = AnalysisReport::build(&features, &outcome, &baseline);
    pipeline.advance(PipelineStage::Evaluated);

    info!(
        rows = report.period.rows,
        trades = report.strategy_metrics.total_trades,
        sharpe = report.strategy_metrics.sharpe_ratio,
        baseline_sharpe = report.baseline_metrics.sharpe_ratio,
        current_signal = report.current_signal,
        "analysis complete"
    );
    Ok(report)
}

/// Validate a polars price table, then run the analysis.
pub fn run_analysis_frame(df: &DataFrame, config: &AnalysisConfig) -> Result<AnalysisReport, RunError> {
    let series = dataframe_to_series(df).map_err(|source| RunError::Pipeline {
        stage: PipelineStage::Raw,
        source,
    })?;
    run_analysis(&series, config)
}

/// Indicator payload trimmed to dates on or after `start`.
pub fn run_indicator_report(series: &PriceSeries, start: Option<NaiveDate>) -> IndicatorReport {
    let report = IndicatorReport::build(series, start);
    info!(rows = report.rows.len(), "indicator report built");
    report
}

/// Stage a search failure terminates in: a window too small for the
/// requested clusters never leaves FEATURES_BUILT, and a search with no
/// admissible attempt ends at VALIDATED.
fn search_failure_stage(err: &CoreError) -> PipelineStage {
    match err {
        CoreError::InsufficientData { .. } => PipelineStage::FeaturesBuilt,
        CoreError::NoValidClustering { .. } => PipelineStage::Validated,
        _ => PipelineStage::Clustered,
    }
}

fn build_features(series: &PriceSeries, config: &AnalysisConfig) -> Result<FeatureMatrix, CoreError> {
    FeatureBuilder::new(config.lookback_window)
        .with_window(config.start_date, config.end_date)
        .build(series)
}

fn run_search<F>(
    features: &FeatureMatrix,
    config: &AnalysisConfig,
    on_stage: F,
) -> Result<SearchOutcome, CoreError>
where
    F: FnMut(PipelineStage),
{
    let params = SearchParams {
        n_clusters: config.n_clusters,
        min_cluster_size: config.min_cluster_size,
        max_attempts: config.max_attempts,
        seeds: config.seed_hierarchy(),
        parallel: config.parallel,
    };
    search_with_stages(features, &params, on_stage)
}
