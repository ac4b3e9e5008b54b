//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(window+1).
//! Seed: EMA[0] = close[0], so the series is defined from the first bar.
//! Lookback: 0.

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    window: usize,
    name: String,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "EMA window must be >= 1");
        Self {
            window,
            name: format!("ema_{window}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.window as f64 + 1.0)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.alpha())
    }
}

/// EMA of an arbitrary series with smoothing factor `alpha`, seeded with the
/// first value. A NaN input taints every later position.
pub fn ema_of_series(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    let Some(&first) = values.first() else {
        return result;
    };

    let mut prev = first;
    result[0] = first;
    for (i, &v) in values.iter().enumerate().skip(1) {
        let ema = alpha * v + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }
    result
}
