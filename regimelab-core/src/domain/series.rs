//! PriceSeries — a validated, date-ordered sequence of bars.

use chrono::NaiveDate;

use super::bar::PriceBar;
use crate::error::{CoreError, SchemaError};

/// Ordered daily price history.
///
/// Construction is the validation gate for the whole pipeline: a
/// `PriceSeries` is never empty, its dates are strictly ascending, and every
/// bar carries finite positive prices. Missing trading days are not filled.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    has_adj_close: bool,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, CoreError> {
        if bars.is_empty() {
            return Err(CoreError::EmptyInput);
        }

        for (row, bar) in bars.iter().enumerate() {
            if let Some(column) = bar.invalid_field() {
                return Err(SchemaError::InvalidValue {
                    row,
                    column: column.to_string(),
                }
                .into());
            }
            if row > 0 && bar.date <= bars[row - 1].date {
                return Err(SchemaError::UnorderedDates { row }.into());
            }
        }

        // Adjusted close is all-or-nothing.
        let adj_count = bars.iter().filter(|b| b.adj_close.is_some()).count();
        if adj_count != 0 && adj_count != bars.len() {
            let row = bars
                .iter()
                .position(|b| b.adj_close.is_none())
                .unwrap_or_default();
            return Err(SchemaError::InvalidValue {
                row,
                column: "Adj Close".into(),
            }
            .into());
        }

        Ok(Self {
            has_adj_close: adj_count == bars.len(),
            bars,
        })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false: construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn has_adj_close(&self) -> bool {
        self.has_adj_close
    }

    /// The bars dated on or after `date`, as a series of their own.
    ///
    /// Fails with [`CoreError::EmptyInput`] when no bar is that recent.
    pub fn since(&self, date: NaiveDate) -> Result<PriceSeries, CoreError> {
        let first = self.bars.partition_point(|b| b.date < date);
        PriceSeries::new(self.bars[first..].to_vec())
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}
