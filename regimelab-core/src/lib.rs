//! RegimeLab Core — price series, indicators, features, regime clustering,
//! signal rules and performance metrics.
//!
//! This crate contains the analysis pipeline itself:
//! - Domain types (price bars, validated price series)
//! - Price-table schema checks over polars DataFrames
//! - Technical indicators behind a single `Indicator` trait
//! - The 8-field feature builder and its missing-value policy
//! - Standardized k-means with per-cluster statistics
//! - Good-cluster signal rules and the `TradingStrategy` contract
//! - Strategy and buy-and-hold metrics
//!
//! Nothing here performs I/O.

pub mod cluster;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod indicators;
pub mod metrics;
pub mod rng;
pub mod signal;
pub mod strategy;

pub use error::{CoreError, SchemaError};
