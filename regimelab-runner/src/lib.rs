//! RegimeLab Runner — analysis orchestration, regime search, reports, data loading.
//!
//! This crate builds on `regimelab-core` to provide:
//! - TOML-backed analysis configuration with range validation
//! - Multi-start k-means search (parallel or sequential, same result)
//! - The staged analysis pipeline and its error reporting
//! - Sanitized output payloads (analysis report, indicator report)
//! - Price loading from CSV, Parquet or a synthetic generator

pub mod config;
pub mod data_loader;
pub mod report;
pub mod runner;
pub mod search;

pub use config::{AnalysisConfig, ConfigError};
pub use data_loader::{load_prices, DataSource, LoadError};
pub use report::{AnalysisReport, FeatureStats, IndicatorReport};
pub use runner::{run_analysis, run_analysis_frame, run_indicator_report, PipelineStage, RunError};
pub use search::{search, search_with_stages, SearchOutcome, SearchParams, StrategyAttempt};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<AnalysisReport>();
        assert_sync::<AnalysisReport>();
        assert_send::<IndicatorReport>();
        assert_sync::<IndicatorReport>();
    }

    #[test]
    fn search_types_are_send_sync() {
        assert_send::<StrategyAttempt>();
        assert_sync::<StrategyAttempt>();
        assert_send::<SearchParams>();
        assert_sync::<SearchParams>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
