//! Facade over the concrete indicators for one validated price series.

use std::collections::BTreeMap;

use super::bollinger::{bollinger_bands, BollingerBands};
use super::ema::Ema;
use super::garman_klass::GarmanKlass;
use super::indicator::{Indicator, IndicatorSet};
use super::momentum::{Momentum, DEFAULT_MOMENTUM_PERIODS};
use super::returns::DailyReturns;
use super::rsi::Rsi;
use super::sma::Sma;
use super::volatility::{Volatility, VolatilityReading};
use super::volume::{DollarVolume, RelativeVolume};
use crate::domain::{PriceBar, PriceSeries};

pub const DEFAULT_SMA_WINDOW: usize = 20;
pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const DEFAULT_BB_WINDOW: usize = 20;
pub const DEFAULT_BB_NUM_STD: f64 = 2.0;
pub const DEFAULT_VOLATILITY_WINDOW: usize = 252;
pub const DEFAULT_RELATIVE_VOLUME_WINDOW: usize = 20;

/// Computes indicator series over a borrowed [`PriceSeries`].
///
/// Every method returns a series aligned 1:1 with the bars.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEngine<'a> {
    series: &'a PriceSeries,
}

impl<'a> IndicatorEngine<'a> {
    pub fn new(series: &'a PriceSeries) -> Self {
        Self { series }
    }

    fn bars(&self) -> &'a [PriceBar] {
        self.series.bars()
    }

    pub fn sma(&self, window: usize) -> Vec<f64> {
        Sma::new(window).compute(self.bars())
    }

    pub fn ema(&self, window: usize) -> Vec<f64> {
        Ema::new(window).compute(self.bars())
    }

    pub fn bollinger(&self, window: usize, num_std: f64) -> BollingerBands {
        bollinger_bands(self.bars(), window, num_std)
    }

    pub fn rsi(&self, window: usize) -> Vec<f64> {
        Rsi::new(window).compute(self.bars())
    }

    pub fn volatility(&self, window: usize) -> VolatilityReading {
        Volatility::new(window).reading(self.bars())
    }

    pub fn garman_klass_volatility(&self) -> Vec<f64> {
        GarmanKlass::new().compute(self.bars())
    }

    pub fn dollar_volume(&self) -> Vec<f64> {
        DollarVolume::new().compute(self.bars())
    }

    pub fn relative_volume(&self, window: usize) -> Vec<f64> {
        RelativeVolume::new(window).compute(self.bars())
    }

    /// Momentum for each period, keyed `momentum_{p}d`.
    pub fn momentum(&self, periods: &[usize]) -> BTreeMap<String, Vec<f64>> {
        periods
            .iter()
            .map(|&p| {
                let indicator = Momentum::new(p);
                (indicator.name().to_string(), indicator.compute(self.bars()))
            })
            .collect()
    }

    pub fn daily_returns(&self) -> Vec<f64> {
        DailyReturns::new().compute(self.bars())
    }

    /// Every indicator series at default parameters, keyed by indicator name.
    pub fn indicator_set(&self) -> IndicatorSet {
        let bars = self.bars();
        let mut set = IndicatorSet::new();

        set.compute_into(&Sma::new(DEFAULT_SMA_WINDOW), bars);
        set.compute_into(&Ema::new(DEFAULT_SMA_WINDOW), bars);
        set.compute_into(&Rsi::new(DEFAULT_RSI_WINDOW), bars);
        set.compute_into(&Volatility::new(DEFAULT_VOLATILITY_WINDOW), bars);
        set.compute_into(&GarmanKlass::new(), bars);
        set.compute_into(&DollarVolume::new(), bars);
        set.compute_into(&RelativeVolume::new(DEFAULT_RELATIVE_VOLUME_WINDOW), bars);
        set.compute_into(&DailyReturns::new(), bars);
        for (name, values) in self.momentum(&DEFAULT_MOMENTUM_PERIODS) {
            set.insert(name, values);
        }

        let bb = self.bollinger(DEFAULT_BB_WINDOW, DEFAULT_BB_NUM_STD);
        set.insert("bb_upper", bb.upper);
        set.insert("bb_middle", bb.middle);
        set.insert("bb_lower", bb.lower);
        set.insert("bb_pct_b", bb.percent_b);
        set.insert("bb_bandwidth", bb.bandwidth);

        set
    }

    /// Number of leading bars dropped before features are used: the longest
    /// warm-up among the indicators that feed the feature vector.
    pub fn warmup_bars() -> usize {
        let lookbacks = [
            Volatility::new(DEFAULT_VOLATILITY_WINDOW).lookback(),
            Momentum::new(20).lookback(),
            Rsi::new(DEFAULT_RSI_WINDOW).lookback(),
            DEFAULT_BB_WINDOW - 1,
            RelativeVolume::new(DEFAULT_RELATIVE_VOLUME_WINDOW).lookback(),
            DailyReturns::new().lookback(),
        ];
        lookbacks.into_iter().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new(make_bars(closes)).unwrap()
    }

    #[test]
    fn engine_series_have_input_length() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let s = series(&closes);
        let engine = IndicatorEngine::new(&s);
        assert_eq!(engine.sma(5).len(), 30);
        assert_eq!(engine.ema(5).len(), 30);
        assert_eq!(engine.rsi(14).len(), 30);
        assert_eq!(engine.volatility(10).series.len(), 30);
        assert_eq!(engine.bollinger(20, 2.0).percent_b.len(), 30);
    }

    #[test]
    fn momentum_collection_is_named() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let s = series(&closes);
        let momentum = IndicatorEngine::new(&s).momentum(&DEFAULT_MOMENTUM_PERIODS);
        let names: Vec<&str> = momentum.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["momentum_10d", "momentum_20d", "momentum_50d", "momentum_5d"]
        );
        assert_approx(momentum["momentum_5d"][5], 105.0 / 100.0 - 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn indicator_set_contains_all_series() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 7) as f64).collect();
        let s = series(&closes);
        let set = IndicatorEngine::new(&s).indicator_set();
        for name in [
            "sma_20",
            "ema_20",
            "rsi_14",
            "volatility_252",
            "garman_klass_vol",
            "dollar_volume",
            "relative_volume_20",
            "return_1d",
            "momentum_20d",
            "bb_upper",
            "bb_pct_b",
            "bb_bandwidth",
        ] {
            let values = set.get_series(name).unwrap_or_else(|| panic!("missing {name}"));
            assert_eq!(values.len(), 40);
        }
    }

    #[test]
    fn warmup_is_the_volatility_window() {
        assert_eq!(IndicatorEngine::warmup_bars(), DEFAULT_VOLATILITY_WINDOW);
    }

    #[test]
    fn indicator_set_matches_direct_computation() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i as f64 / 9.0).sin()).collect();
        let s = series(&closes);
        let engine = IndicatorEngine::new(&s);
        let set = engine.indicator_set();
        let vol = engine.volatility(DEFAULT_VOLATILITY_WINDOW).series;
        assert_eq!(set.get("volatility_252", 299), Some(vol[299]));
        assert_eq!(set.get("rsi_14", 50), Some(engine.rsi(14)[50]));
        assert!(set.get("volatility_252", 251).is_some_and(f64::is_nan));
    }
}
