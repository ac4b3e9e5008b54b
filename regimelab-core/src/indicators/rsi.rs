//! Relative Strength Index (RSI).
//!
//! Average gain and average loss are simple rolling means of the positive and
//! negative parts of close-to-close changes (not Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: window.
//! Edge cases: avg_loss == 0 and avg_gain > 0 → 100; avg_gain == 0 and
//! avg_loss > 0 → 0; no movement at all → undefined.

use super::indicator::Indicator;
use super::rolling::rolling_mean;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    window: usize,
    name: String,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RSI window must be >= 1");
        Self {
            window,
            name: format!("rsi_{window}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            gains[i] = change.max(0.0);
            losses[i] = (-change).max(0.0);
        }

        let avg_gains = rolling_mean(&gains, self.window);
        let avg_losses = rolling_mean(&losses, self.window);

        avg_gains
            .iter()
            .zip(&avg_losses)
            .map(|(&g, &l)| rsi_from_averages(g, l))
            .collect()
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 && avg_gain == 0.0 {
        f64::NAN // RS = 0/0
    } else if avg_loss == 0.0 {
        100.0 // RS → ∞
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
