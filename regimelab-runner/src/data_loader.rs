//! Price-table loading for the runner.
//!
//! Three sources, all ending in a validated [`PriceSeries`]:
//! 1. CSV with a `Date,Open,High,Low,Close,Volume[,Adj Close]` header
//! 2. Parquet with the same columns (`Date` of date dtype)
//! 3. A deterministic synthetic business-day series for demos and tests
//!
//! Missing columns fail before any row is parsed. Synthetic data is tagged
//! with a warning in the log.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use polars::prelude::{ParquetReader, PolarsError, SerReader};
use thiserror::Error;
use tracing::{info, warn};

use regimelab_core::data::schema::{ADJ_CLOSE_COLUMN, DATE_COLUMN};
use regimelab_core::data::{dataframe_to_series, REQUIRED_COLUMNS};
use regimelab_core::domain::{PriceBar, PriceSeries};
use regimelab_core::{CoreError, SchemaError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] PolarsError),

    #[error("{0}")]
    Schema(#[from] CoreError),
}

impl From<SchemaError> for LoadError {
    fn from(err: SchemaError) -> Self {
        LoadError::Schema(err.into())
    }
}

/// Where to read prices from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv(PathBuf),
    Parquet(PathBuf),
    Synthetic { bars: usize, start: NaiveDate },
}

pub fn load_prices(source: &DataSource) -> Result<PriceSeries, LoadError> {
    let series = match source {
        DataSource::Csv(path) => load_csv(path)?,
        DataSource::Parquet(path) => load_parquet(path)?,
        DataSource::Synthetic { bars, start } => synthetic_series(*bars, *start)?,
    };
    info!(
        rows = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        adjusted = series.has_adj_close(),
        "price series loaded"
    );
    Ok(series)
}

pub fn load_csv(path: &Path) -> Result<PriceSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Parse a price CSV from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let date_idx = position(DATE_COLUMN)
        .ok_or_else(|| SchemaError::MissingColumn(DATE_COLUMN.to_string()))?;
    let mut value_idx = [0usize; 5];
    for (slot, name) in value_idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = position(name).ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
    }
    let adj_idx = position(ADJ_CLOSE_COLUMN);

    let mut bars = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let date = NaiveDate::parse_from_str(field(&record, date_idx, row, DATE_COLUMN)?, "%Y-%m-%d")
            .map_err(|_| SchemaError::InvalidValue {
                row,
                column: DATE_COLUMN.to_string(),
            })?;
        let number = |idx: usize, column: &str| number_field(&record, idx, row, column);
        let adj_close = match adj_idx {
            Some(idx) => Some(number(idx, ADJ_CLOSE_COLUMN)?),
            None => None,
        };

        bars.push(PriceBar {
            date,
            open: number(value_idx[0], REQUIRED_COLUMNS[0])?,
            high: number(value_idx[1], REQUIRED_COLUMNS[1])?,
            low: number(value_idx[2], REQUIRED_COLUMNS[2])?,
            close: number(value_idx[3], REQUIRED_COLUMNS[3])?,
            volume: number(value_idx[4], REQUIRED_COLUMNS[4])?,
            adj_close,
        });
    }

    Ok(PriceSeries::new(bars)?)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> Result<&'r str, SchemaError> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SchemaError::InvalidValue {
            row,
            column: column.to_string(),
        }),
    }
}

fn number_field(
    record: &csv::StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> Result<f64, SchemaError> {
    field(record, idx, row, column)?
        .parse::<f64>()
        .map_err(|_| SchemaError::InvalidValue {
            row,
            column: column.to_string(),
        })
}

pub fn load_parquet(path: &Path) -> Result<PriceSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file).finish()?;
    Ok(dataframe_to_series(&df)?)
}

/// Deterministic weekday-only series: a 40-day sine cycle on a gentle
/// uptrend, with volume on a 15-day cycle.
pub fn synthetic_series(n_bars: usize, start: NaiveDate) -> Result<PriceSeries, LoadError> {
    warn!(bars = n_bars, %start, "using synthetic price data");

    let mut bars = Vec::with_capacity(n_bars);
    let mut date = start;
    let mut prev_close = None;

    while bars.len() < n_bars {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
            continue;
        }
        let i = bars.len() as f64;
        let close = 100.0
            + 10.0 * (2.0 * std::f64::consts::PI * i / 40.0).sin()
            + 0.05 * i;
        let open = prev_close.unwrap_or(close);
        bars.push(PriceBar {
            date,
            open,
            high: open.max(close) + 0.5,
            low: open.min(close) - 0.5,
            close,
            volume: 1_000_000.0 + 200_000.0 * (2.0 * std::f64::consts::PI * i / 15.0).sin(),
            adj_close: None,
        });
        prev_close = Some(close);
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    Ok(PriceSeries::new(bars)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame, DataType, ParquetWriter};

    const CSV: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,100.0,102.0,99.0,101.0,100.5,1000000
2024-01-03,101.0,103.0,100.0,102.0,101.5,1100000
2024-01-04,102.0,104.0,101.0,103.0,102.5,900000
";

    #[test]
    fn reads_csv_with_adjusted_close() {
        let series = read_csv(CSV.as_bytes()).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.has_adj_close());
        let first = &series.bars()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first.close, 101.0);
        assert_eq!(first.adj_close, Some(100.5));
        assert_eq!(first.volume, 1_000_000.0);
    }

    #[test]
    fn missing_column_is_schema_error() {
        let csv = "Date,Open,High,Low,Close\n2024-01-02,1,2,0.5,1.5\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(CoreError::Schema(SchemaError::MissingColumn(ref c))) if c == "Volume"
        ));
    }

    #[test]
    fn bad_number_reports_row_and_column() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,100\n2024-01-03,abc,2,0.5,1.5,100\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(CoreError::Schema(SchemaError::InvalidValue { row: 1, ref column })) if column == "Open"
        ));
    }

    #[test]
    fn bad_date_is_invalid_value() {
        let csv = "Date,Open,High,Low,Close,Volume\n01/02/2024,1,2,0.5,1.5,100\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(CoreError::Schema(SchemaError::InvalidValue { row: 0, .. }))
        ));
    }

    #[test]
    fn header_only_csv_is_empty_input() {
        let csv = "Date,Open,High,Low,Close,Volume\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Schema(CoreError::EmptyInput)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv(Path::new("/nonexistent/prices.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn parquet_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.parquet");

        let mut df = DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), &[19724i32, 19725, 19726])
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("Open".into(), &[100.0, 101.0, 102.0]),
            Column::new("High".into(), &[102.0, 103.0, 104.0]),
            Column::new("Low".into(), &[99.0, 100.0, 101.0]),
            Column::new("Close".into(), &[101.0, 102.0, 103.0]),
            Column::new("Volume".into(), &[1_000i64, 1_100, 900]),
        ])
        .unwrap();
        let mut file = File::create(&path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();

        let series = load_prices(&DataSource::Parquet(path)).unwrap();
        assert_eq!(series.len(), 3);
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![101.0, 102.0, 103.0]);
    }

    #[test]
    fn synthetic_series_skips_weekends_and_is_deterministic() {
        // 2024-01-05 is a Friday.
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let a = synthetic_series(10, start).unwrap();
        let b = synthetic_series(10, start).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert_eq!(a.bars()[1].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert!(a
            .bars()
            .iter()
            .all(|bar| !matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn synthetic_zero_bars_is_empty_input() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(matches!(
            synthetic_series(0, start),
            Err(LoadError::Schema(CoreError::EmptyInput))
        ));
    }
}
