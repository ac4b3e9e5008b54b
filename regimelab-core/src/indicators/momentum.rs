//! Price momentum: close[t] / close[t - period] - 1.
//! Lookback: period.

use super::indicator::Indicator;
use super::rolling::pct_change;
use crate::domain::PriceBar;

/// Default momentum horizons in trading days.
pub const DEFAULT_MOMENTUM_PERIODS: [usize; 4] = [5, 10, 20, 50];

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    name: String,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Momentum period must be >= 1");
        Self {
            period,
            name: format!("momentum_{period}d"),
        }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        pct_change(&closes, self.period)
    }
}
