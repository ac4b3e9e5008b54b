//! Garman-Klass volatility estimator (single-bar form).
//!
//! GK = (ln H - ln L)² / 2 - (2 ln 2 - 1) × (ln C - ln O)²
//! Lookback: 0. Prices are validated positive, so the logs are defined.

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Default)]
pub struct GarmanKlass;

impl GarmanKlass {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for GarmanKlass {
    fn name(&self) -> &str {
        "garman_klass_vol"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let open_close_weight = 2.0 * std::f64::consts::LN_2 - 1.0;
        bars.iter()
            .map(|b| {
                let hl = b.high.ln() - b.low.ln();
                let co = b.close.ln() - b.open.ln();
                hl * hl / 2.0 - open_close_weight * co * co
            })
            .collect()
    }
}
