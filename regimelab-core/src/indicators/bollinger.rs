//! Bollinger Bands — moving average +/- a multiple of the rolling sample
//! standard deviation, plus the derived %B and bandwidth series.
//!
//! - Middle: SMA(close, window)
//! - Upper/Lower: middle ± num_std × stddev(close, window)
//! - %B: (close - lower) / (upper - lower), undefined when the bands collapse
//! - Bandwidth: (upper - lower) / middle, undefined when middle is zero
//!
//! Each band is exposed as its own `Indicator` instance; `bollinger_bands`
//! computes all five at once.
//! Lookback: window - 1.

use super::indicator::Indicator;
use super::rolling::{rolling_mean, rolling_std};
use crate::domain::PriceBar;

/// Which Bollinger series an instance computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    PercentB,
    Bandwidth,
}

impl BollingerBand {
    fn label(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Middle => "middle",
            Self::Lower => "lower",
            Self::PercentB => "pct_b",
            Self::Bandwidth => "bandwidth",
        }
    }
}

/// All Bollinger series for one bar history.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
    pub percent_b: Vec<f64>,
    pub bandwidth: Vec<f64>,
}

impl BollingerBands {
    pub fn band(&self, band: BollingerBand) -> &[f64] {
        match band {
            BollingerBand::Upper => &self.upper,
            BollingerBand::Middle => &self.middle,
            BollingerBand::Lower => &self.lower,
            BollingerBand::PercentB => &self.percent_b,
            BollingerBand::Bandwidth => &self.bandwidth,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    num_std: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(window: usize, num_std: f64, band: BollingerBand) -> Self {
        assert!(window >= 2, "Bollinger window must be >= 2");
        Self {
            window,
            num_std,
            band,
            name: format!("bb_{}_{window}_{num_std}", band.label()),
        }
    }

    pub fn upper(window: usize, num_std: f64) -> Self {
        Self::new(window, num_std, BollingerBand::Upper)
    }

    pub fn middle(window: usize, num_std: f64) -> Self {
        Self::new(window, num_std, BollingerBand::Middle)
    }

    pub fn lower(window: usize, num_std: f64) -> Self {
        Self::new(window, num_std, BollingerBand::Lower)
    }

    pub fn percent_b(window: usize, num_std: f64) -> Self {
        Self::new(window, num_std, BollingerBand::PercentB)
    }

    pub fn bandwidth(window: usize, num_std: f64) -> Self {
        Self::new(window, num_std, BollingerBand::Bandwidth)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        bollinger_bands(bars, self.window, self.num_std)
            .band(self.band)
            .to_vec()
    }
}

/// Compute every Bollinger series in one pass over the rolling statistics.
pub fn bollinger_bands(bars: &[PriceBar], window: usize, num_std: f64) -> BollingerBands {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middle = rolling_mean(&closes, window);
    let std = rolling_std(&closes, window);

    let n = closes.len();
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    let mut percent_b = vec![f64::NAN; n];
    let mut bandwidth = vec![f64::NAN; n];

    for i in 0..n {
        if middle[i].is_nan() || std[i].is_nan() {
            continue;
        }
        upper[i] = middle[i] + num_std * std[i];
        lower[i] = middle[i] - num_std * std[i];

        let width = upper[i] - lower[i];
        if width != 0.0 {
            percent_b[i] = (closes[i] - lower[i]) / width;
        }
        if middle[i] != 0.0 {
            bandwidth[i] = width / middle[i];
        }
    }

    BollingerBands {
        upper,
        middle,
        lower,
        percent_b,
        bandwidth,
    }
}
