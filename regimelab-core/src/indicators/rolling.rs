//! Rolling-window helpers over plain `f64` slices.
//!
//! A window containing a NaN yields NaN, and positions with fewer than
//! `window` observations yield NaN (full-window semantics).

/// Rolling arithmetic mean.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().sum::<f64>() / window as f64;
    }
    result
}

/// Rolling sample standard deviation (divides by `window - 1`).
///
/// A window of 1 has no sample deviation and yields NaN throughout.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window < 2 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance =
            slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        result[i] = variance.sqrt();
    }
    result
}

/// Percentage change over `period` positions: `v[t] / v[t - period] - 1`.
///
/// Undefined when either endpoint is NaN or the base is zero.
pub fn pct_change(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    for i in period..n {
        let base = values[i - period];
        let curr = values[i];
        if base.is_nan() || curr.is_nan() || base == 0.0 {
            continue;
        }
        result[i] = curr / base - 1.0;
    }
    result
}
