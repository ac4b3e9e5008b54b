//! Price-table schema contract and DataFrame conversion.
//!
//! The input table is date-indexed with `Open, High, Low, Close, Volume`
//! and an optional `Adj Close`. Validation runs before any indicator math:
//! missing columns and wrong dtypes fail with [`SchemaError`].

use chrono::NaiveDate;
use polars::prelude::*;

use crate::domain::{PriceBar, PriceSeries};
use crate::error::{CoreError, SchemaError};

pub const DATE_COLUMN: &str = "Date";
pub const ADJ_CLOSE_COLUMN: &str = "Adj Close";

/// Numeric OHLCV columns every price table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// Expected schema for price tables.
pub struct PriceSchema;

impl PriceSchema {
    /// Check column presence and dtypes without reading any values.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let actual = df.schema();

        let date_dtype = actual
            .get(DATE_COLUMN)
            .ok_or_else(|| SchemaError::MissingColumn(DATE_COLUMN.to_string()))?;
        if *date_dtype != DataType::Date {
            return Err(SchemaError::TypeMismatch {
                column: DATE_COLUMN.to_string(),
                expected: "date".into(),
                actual: format!("{date_dtype}"),
            });
        }

        for name in REQUIRED_COLUMNS {
            let dtype = actual
                .get(name)
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
            check_numeric(name, dtype)?;
        }

        if let Some(dtype) = actual.get(ADJ_CLOSE_COLUMN) {
            check_numeric(ADJ_CLOSE_COLUMN, dtype)?;
        }

        Ok(())
    }
}

fn check_numeric(column: &str, dtype: &DataType) -> Result<(), SchemaError> {
    match dtype {
        DataType::Float64
        | DataType::Float32
        | DataType::Int64
        | DataType::Int32
        | DataType::UInt64
        | DataType::UInt32 => Ok(()),
        other => Err(SchemaError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric".into(),
            actual: format!("{other}"),
        }),
    }
}

/// Convert a validated price table into a [`PriceSeries`].
///
/// Null cells are reported as [`SchemaError::InvalidValue`] with their row.
pub fn dataframe_to_series(df: &DataFrame) -> Result<PriceSeries, CoreError> {
    PriceSchema::validate(df)?;
    if df.height() == 0 {
        return Err(CoreError::EmptyInput);
    }

    let parse_err = |e: PolarsError| SchemaError::Parse(e.to_string());

    let date_col = df.column(DATE_COLUMN).map_err(parse_err)?;
    let date_ca = date_col.date().map_err(parse_err)?;

    let mut numeric = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        numeric.push(float_column(df, name)?);
    }
    let adj = if df.schema().contains(ADJ_CLOSE_COLUMN) {
        Some(float_column(df, ADJ_CLOSE_COLUMN)?)
    } else {
        None
    };

    let epoch = epoch();
    let n = df.height();
    let mut bars = Vec::with_capacity(n);

    for row in 0..n {
        let days = date_ca.get(row).ok_or_else(|| SchemaError::InvalidValue {
            row,
            column: DATE_COLUMN.to_string(),
        })?;
        let cell = |idx: usize| -> Result<f64, SchemaError> {
            numeric[idx].get(row).ok_or_else(|| SchemaError::InvalidValue {
                row,
                column: REQUIRED_COLUMNS[idx].to_string(),
            })
        };

        let adj_close = match &adj {
            Some(ca) => Some(ca.get(row).ok_or_else(|| SchemaError::InvalidValue {
                row,
                column: ADJ_CLOSE_COLUMN.to_string(),
            })?),
            None => None,
        };

        bars.push(PriceBar {
            date: epoch + chrono::Duration::days(days as i64),
            open: cell(0)?,
            high: cell(1)?,
            low: cell(2)?,
            close: cell(3)?,
            volume: cell(4)?,
            adj_close,
        });
    }

    PriceSeries::new(bars)
}

/// Convert a [`PriceSeries`] into a price table with the canonical columns.
pub fn series_to_dataframe(series: &PriceSeries) -> PolarsResult<DataFrame> {
    let bars = series.bars();
    let epoch = epoch();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();

    let mut columns = vec![
        Column::new(DATE_COLUMN.into(), dates).cast(&DataType::Date)?,
        Column::new("Open".into(), bars.iter().map(|b| b.open).collect::<Vec<f64>>()),
        Column::new("High".into(), bars.iter().map(|b| b.high).collect::<Vec<f64>>()),
        Column::new("Low".into(), bars.iter().map(|b| b.low).collect::<Vec<f64>>()),
        Column::new("Close".into(), bars.iter().map(|b| b.close).collect::<Vec<f64>>()),
        Column::new("Volume".into(), bars.iter().map(|b| b.volume).collect::<Vec<f64>>()),
    ];
    if series.has_adj_close() {
        let adj: Vec<f64> = bars.iter().map(|b| b.return_basis()).collect();
        columns.push(Column::new(ADJ_CLOSE_COLUMN.into(), adj));
    }

    DataFrame::new(columns)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked, SchemaError> {
    let parse_err = |e: PolarsError| SchemaError::Parse(format!("{name}: {e}"));
    let column = df
        .column(name)
        .map_err(parse_err)?
        .cast(&DataType::Float64)
        .map_err(parse_err)?;
    Ok(column.f64().map_err(parse_err)?.clone())
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}
