//! Per-day clustering features.
//!
//! The feature vector has exactly eight fields in a fixed order. Indicator
//! series are computed over the available history, the warm-up rows are dropped,
//! the optional analysis window is applied, and only then are the remaining
//! gaps filled: forward, backward, then a neutral per-field default. This is
//! the only place in the pipeline where missing values are filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::indicators::engine::{
    DEFAULT_BB_NUM_STD, DEFAULT_BB_WINDOW, DEFAULT_RELATIVE_VOLUME_WINDOW, DEFAULT_RSI_WINDOW,
    DEFAULT_VOLATILITY_WINDOW,
};
use crate::indicators::IndicatorEngine;

pub const FEATURE_COUNT: usize = 8;

/// Fewest rows a feature matrix may have.
pub const MIN_FEATURE_ROWS: usize = 20;

/// Momentum horizon used as a feature.
pub const FEATURE_MOMENTUM_PERIOD: usize = 20;

/// One field of the feature vector, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    #[serde(rename = "return_1d")]
    Return1d,
    Vol,
    #[serde(rename = "momentum_20d")]
    Momentum20d,
    Rsi,
    BbPosition,
    DollarVolume,
    RelativeVolume,
    GarmanKlassVol,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Return1d,
        Feature::Vol,
        Feature::Momentum20d,
        Feature::Rsi,
        Feature::BbPosition,
        Feature::DollarVolume,
        Feature::RelativeVolume,
        Feature::GarmanKlassVol,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::Return1d => "return_1d",
            Feature::Vol => "vol",
            Feature::Momentum20d => "momentum_20d",
            Feature::Rsi => "rsi",
            Feature::BbPosition => "bb_position",
            Feature::DollarVolume => "dollar_volume",
            Feature::RelativeVolume => "relative_volume",
            Feature::GarmanKlassVol => "garman_klass_vol",
        }
    }

    /// Neutral value for a field with no observation anywhere in the window.
    pub fn default_fill(self) -> f64 {
        match self {
            Feature::Rsi => 50.0,
            Feature::BbPosition => 0.5,
            Feature::RelativeVolume => 1.0,
            _ => 0.0,
        }
    }
}

/// Dense, gap-free feature rows aligned with their dates.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    dates: Vec<NaiveDate>,
    rows: Vec<[f64; FEATURE_COUNT]>,
}

impl FeatureMatrix {
    /// Build from pre-filled rows. Lengths must match and every value must be
    /// finite.
    pub fn new(dates: Vec<NaiveDate>, rows: Vec<[f64; FEATURE_COUNT]>) -> Result<Self, CoreError> {
        if dates.len() != rows.len() {
            return Err(CoreError::InvalidParameter(format!(
                "{} dates for {} feature rows",
                dates.len(),
                rows.len()
            )));
        }
        if let Some(row) = rows.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(CoreError::InvalidParameter(format!(
                "feature row {row} contains a non-finite value"
            )));
        }
        Ok(Self { dates, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.rows
    }

    pub fn column(&self, feature: Feature) -> Vec<f64> {
        self.rows.iter().map(|r| r[feature.index()]).collect()
    }

    /// The `return_1d` column: the realized return on each date.
    pub fn returns(&self) -> Vec<f64> {
        self.column(Feature::Return1d)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Calendar days of extra history kept ahead of `lookback_window`.
pub const HISTORY_BUFFER_DAYS: i64 = 50;

/// Builds a [`FeatureMatrix`] from a price series.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    lookback_window: usize,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl FeatureBuilder {
    /// `lookback_window` is how many calendar days of history before the
    /// window start (plus [`HISTORY_BUFFER_DAYS`]) feed the indicators.
    /// Without a window start the whole series is used.
    pub fn new(lookback_window: usize) -> Self {
        Self {
            lookback_window,
            start: None,
            end: None,
        }
    }

    /// Restrict the output to dates within `[start, end]` (inclusive).
    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Warm-up rows dropped from the front of the history.
    pub fn burn_in(&self) -> usize {
        IndicatorEngine::warmup_bars()
    }

    /// First date of history the indicators may see.
    pub fn history_start(&self) -> Option<NaiveDate> {
        let days = i64::try_from(self.lookback_window).ok()? + HISTORY_BUFFER_DAYS;
        self.start
            .and_then(|s| s.checked_sub_signed(chrono::Duration::days(days)))
    }

    pub fn build(&self, series: &PriceSeries) -> Result<FeatureMatrix, CoreError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(CoreError::InvalidParameter(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }

        let trimmed;
        let series = match self.history_start() {
            Some(from) if from > series.first_date() => {
                trimmed = series.since(from).map_err(|_| CoreError::InsufficientData {
                    rows: 0,
                    required: MIN_FEATURE_ROWS,
                })?;
                &trimmed
            }
            _ => series,
        };

        let engine = IndicatorEngine::new(series);
        let momentum = engine.momentum(&[FEATURE_MOMENTUM_PERIOD]);
        let momentum = momentum.into_values().next().unwrap_or_default();
        let bollinger = engine.bollinger(DEFAULT_BB_WINDOW, DEFAULT_BB_NUM_STD);

        let mut columns: [Vec<f64>; FEATURE_COUNT] = [
            engine.daily_returns(),
            engine.volatility(DEFAULT_VOLATILITY_WINDOW).series,
            momentum,
            engine.rsi(DEFAULT_RSI_WINDOW),
            bollinger.percent_b,
            engine.dollar_volume(),
            engine.relative_volume(DEFAULT_RELATIVE_VOLUME_WINDOW),
            engine.garman_klass_volatility(),
        ];

        let burn_in = self.burn_in().min(series.len());
        let keep: Vec<usize> = (burn_in..series.len())
            .filter(|&i| {
                let date = series.bars()[i].date;
                self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
            })
            .collect();

        debug!(
            total = series.len(),
            burn_in,
            kept = keep.len(),
            "feature window selected"
        );

        if keep.len() < MIN_FEATURE_ROWS {
            return Err(CoreError::InsufficientData {
                rows: keep.len(),
                required: MIN_FEATURE_ROWS,
            });
        }

        for (feature, column) in Feature::ALL.iter().zip(columns.iter_mut()) {
            let mut window: Vec<f64> = keep.iter().map(|&i| column[i]).collect();
            fill_missing(&mut window, feature.default_fill());
            *column = window;
        }

        let rows = (0..keep.len())
            .map(|r| std::array::from_fn(|c| columns[c][r]))
            .collect();
        let dates = keep.iter().map(|&i| series.bars()[i].date).collect();

        FeatureMatrix::new(dates, rows)
    }
}

/// Forward-fill, then backward-fill, then `default` for an all-missing
/// column. Non-finite values count as missing.
pub fn fill_missing(values: &mut [f64], default: f64) {
    let mut last = None;
    for v in values.iter_mut() {
        if v.is_finite() {
            last = Some(*v);
        } else if let Some(prev) = last {
            *v = prev;
        }
    }

    let mut next = None;
    for v in values.iter_mut().rev() {
        if v.is_finite() {
            next = Some(*v);
        } else if let Some(following) = next {
            *v = following;
        }
    }

    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = default;
        }
    }
}
