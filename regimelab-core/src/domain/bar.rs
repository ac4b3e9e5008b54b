//! PriceBar — one trading day of OHLCV data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single trading day.
///
/// `adj_close` is optional: when present, daily returns are measured on it
/// instead of `close`. Every other indicator uses the raw OHLC columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<f64>,
}

impl PriceBar {
    /// Name of the first field that cannot feed indicator math, if any.
    ///
    /// Prices must be finite and strictly positive (logs are taken for
    /// Garman-Klass); volume must be finite and non-negative.
    pub fn invalid_field(&self) -> Option<&'static str> {
        let prices = [
            ("Open", self.open),
            ("High", self.high),
            ("Low", self.low),
            ("Close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Some(name);
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("Volume");
        }
        match self.adj_close {
            Some(v) if !v.is_finite() || v <= 0.0 => Some("Adj Close"),
            _ => None,
        }
    }

    /// Price used for return computation: adjusted close when available.
    pub fn return_basis(&self) -> f64 {
        self.adj_close.unwrap_or(self.close)
    }
}
