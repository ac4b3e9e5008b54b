//! Price-table ingestion and validation

pub mod schema;

pub use schema::{dataframe_to_series, series_to_dataframe, PriceSchema, REQUIRED_COLUMNS};
