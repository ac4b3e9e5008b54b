//! Daily simple returns on the return basis (adjusted close when the series
//! carries it, close otherwise).
//! Lookback: 1.

use super::indicator::Indicator;
use super::rolling::pct_change;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Default)]
pub struct DailyReturns;

impl DailyReturns {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for DailyReturns {
    fn name(&self) -> &str {
        "return_1d"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let basis: Vec<f64> = bars.iter().map(PriceBar::return_basis).collect();
        pct_change(&basis, 1)
    }
}
