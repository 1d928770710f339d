//! Descriptive statistics over plain slices

use crate::{MathError, Result};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Mean of an empty slice is undefined".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile with linear interpolation between closest ranks.
///
/// Uses position `q * (n - 1)` in the sorted data, the same convention as
/// numpy's and pandas' default.
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be within [0, 1], got {}",
            q
        )));
    }
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Quantile of an empty slice is undefined".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Quantile input contains non-finite values".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Quartiles of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    /// First quartile (25th percentile)
    pub q1: f64,
    /// Third quartile (75th percentile)
    pub q3: f64,
}

impl Quartiles {
    /// Compute Q1 and Q3 of the sample
    pub fn of(values: &[f64]) -> Result<Self> {
        Ok(Self {
            q1: quantile(values, 0.25)?,
            q3: quantile(values, 0.75)?,
        })
    }

    /// Interquartile range, Q3 - Q1
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`
    pub fn fences(&self, k: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - k * iqr, self.q3 + k * iqr)
    }
}
