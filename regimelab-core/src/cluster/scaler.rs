//! Z-score standardization fitted on the rows being clustered.

/// Per-column mean and population standard deviation.
///
/// Zero-variance columns are centred but left unscaled so they map to 0
/// instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler<const D: usize> {
    means: [f64; D],
    scales: [f64; D],
}

impl<const D: usize> StandardScaler<D> {
    pub fn fit(rows: &[[f64; D]]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut means = [0.0; D];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = [0.0; D];
        for row in rows {
            for c in 0..D {
                scales[c] += (row[c] - means[c]).powi(2);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std > 0.0 { std } else { 1.0 };
        }

        Self { means, scales }
    }

    pub fn transform(&self, rows: &[[f64; D]]) -> Vec<[f64; D]> {
        rows.iter()
            .map(|row| std::array::from_fn(|c| (row[c] - self.means[c]) / self.scales[c]))
            .collect()
    }

    pub fn means(&self) -> &[f64; D] {
        &self.means
    }

    /// Divisors per column (1.0 for zero-variance columns).
    pub fn scales(&self) -> &[f64; D] {
        &self.scales
    }
}
