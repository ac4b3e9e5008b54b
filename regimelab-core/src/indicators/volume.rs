//! Volume-based indicators.
//!
//! - Dollar volume: close × volume / 1e6 (millions). Lookback: 0.
//! - Relative volume: volume / SMA(volume, window). Lookback: window - 1.
//!   Undefined, infinite or zero-denominator ratios (including the warm-up)
//!   resolve to [`RELATIVE_VOLUME_FLOOR`].

use super::indicator::Indicator;
use super::rolling::rolling_mean;
use crate::domain::PriceBar;
use crate::error::checked_ratio;

/// Sentinel for "relative volume not measurable".
pub const RELATIVE_VOLUME_FLOOR: f64 = 0.0001;

#[derive(Debug, Clone, Default)]
pub struct DollarVolume;

impl DollarVolume {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for DollarVolume {
    fn name(&self) -> &str {
        "dollar_volume"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        bars.iter().map(|b| b.close * b.volume / 1e6).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RelativeVolume {
    window: usize,
    name: String,
}

impl RelativeVolume {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RelativeVolume window must be >= 1");
        Self {
            window,
            name: format!("relative_volume_{window}"),
        }
    }
}

impl Indicator for RelativeVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let averages = rolling_mean(&volumes, self.window);
        volumes
            .iter()
            .zip(&averages)
            .map(|(&v, &avg)| {
                checked_ratio("relative_volume", v, avg).unwrap_or(RELATIVE_VOLUME_FLOOR)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn dollar_volume_in_millions() {
        let mut bars = make_bars(&[50.0]);
        bars[0].volume = 2_000_000.0;
        let result = DollarVolume::new().compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn relative_volume_basic() {
        let mut bars = make_bars(&[10.0, 10.0, 10.0]);
        bars[0].volume = 100.0;
        bars[1].volume = 200.0;
        bars[2].volume = 300.0;
        let result = RelativeVolume::new(2).compute(&bars);

        assert_eq!(result[0], RELATIVE_VOLUME_FLOOR);
        assert_approx(result[1], 200.0 / 150.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0 / 250.0, DEFAULT_EPSILON);
    }

    #[test]
    fn relative_volume_zero_average_uses_floor() {
        let mut bars = make_bars(&[10.0, 10.0, 10.0]);
        for bar in &mut bars {
            bar.volume = 0.0;
        }
        let result = RelativeVolume::new(2).compute(&bars);
        assert!(result.iter().all(|&v| v == RELATIVE_VOLUME_FLOOR));
    }

    #[test]
    fn relative_volume_never_undefined() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let result = RelativeVolume::new(20).compute(&bars);
        assert!(result.iter().all(|v| v.is_finite()));
    }
}
