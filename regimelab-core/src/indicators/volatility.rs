//! Annualized historical volatility.
//!
//! Rolling sample standard deviation of daily close-to-close percentage
//! returns, scaled by √252.
//! Lookback: window (the first bar has no return).

use super::indicator::Indicator;
use super::rolling::{pct_change, rolling_std};
use crate::domain::PriceBar;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone)]
pub struct Volatility {
    window: usize,
    name: String,
}

impl Volatility {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "Volatility window must be >= 2");
        Self {
            window,
            name: format!("volatility_{window}"),
        }
    }

    /// Compute the series together with its most recent value.
    pub fn reading(&self, bars: &[PriceBar]) -> VolatilityReading {
        VolatilityReading::from_series(self.compute(bars))
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let returns = pct_change(&closes, 1);
        rolling_std(&returns, self.window)
            .into_iter()
            .map(|s| s * TRADING_DAYS_PER_YEAR.sqrt())
            .collect()
    }
}

/// Volatility series plus the value on the last bar.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityReading {
    /// `None` when the last bar is still inside the warm-up.
    pub latest: Option<f64>,
    pub series: Vec<f64>,
}

impl VolatilityReading {
    pub fn from_series(series: Vec<f64>) -> Self {
        let latest = series.last().copied().filter(|v| !v.is_nan());
        Self { latest, series }
    }
}
