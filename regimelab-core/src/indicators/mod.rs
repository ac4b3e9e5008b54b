//! Technical indicators over daily price bars.
//!
//! Every indicator implements [`Indicator`]; multi-series indicators
//! (Bollinger) are exposed as separate named instances per band plus a bulk
//! function. [`IndicatorEngine`] is the facade the feature builder and the
//! indicator report use.

pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod garman_klass;
pub mod indicator;
pub mod momentum;
pub mod returns;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod volatility;
pub mod volume;

pub use bollinger::{bollinger_bands, Bollinger, BollingerBand, BollingerBands};
pub use ema::Ema;
pub use engine::IndicatorEngine;
pub use garman_klass::GarmanKlass;
pub use indicator::{Indicator, IndicatorSet};
pub use momentum::{Momentum, DEFAULT_MOMENTUM_PERIODS};
pub use returns::DailyReturns;
pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::{Volatility, VolatilityReading, TRADING_DAYS_PER_YEAR};
pub use volume::{DollarVolume, RelativeVolume, RELATIVE_VOLUME_FLOOR};

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                adj_close: None,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
