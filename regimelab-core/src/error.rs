//! Error taxonomy for the core pipeline.
//!
//! Data-shape and data-sufficiency failures are typed errors surfaced to the
//! caller. Degenerate ratios (zero denominators) are *not* errors at this
//! level: they come back from [`checked_ratio`] as [`DegenerateMetric`] and
//! every call site resolves them to a documented sentinel on the spot.

use thiserror::Error;

/// Errors raised while validating an input price table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid value in column {column} at row {row}")]
    InvalidValue { row: usize, column: String },

    #[error("Dates must be strictly ascending (violation at row {row})")]
    UnorderedDates { row: usize },

    #[error("Failed to read price table: {0}")]
    Parse(String),
}

/// Errors surfaced by the core pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("price series is empty")]
    EmptyInput,

    #[error("insufficient data: {rows} usable rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    #[error(
        "no valid clustering after {attempts} attempts (every cluster needs at least {min_cluster_size} members)"
    )]
    NoValidClustering {
        attempts: usize,
        min_cluster_size: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("strategy must be trained before use")]
    NotTrained,
}

/// A ratio whose denominator was zero (or whose result was not finite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("degenerate metric '{metric}': denominator is zero")]
pub struct DegenerateMetric {
    pub metric: &'static str,
}

/// `numerator / denominator`, or [`DegenerateMetric`] when the division has
/// no finite answer.
pub fn checked_ratio(
    metric: &'static str,
    numerator: f64,
    denominator: f64,
) -> Result<f64, DegenerateMetric> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return Err(DegenerateMetric { metric });
    }
    let value = numerator / denominator;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DegenerateMetric { metric })
    }
}
