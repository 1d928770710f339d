//! Moving average calculation implementations
//!
//! Contains:
//! - Simple Moving Average (SMA), streaming
//! - Trailing rolling mean over a series with gaps
//! - Centered moving average used for trend extraction

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Trailing rolling mean over a series that may contain gaps.
///
/// Position `i` holds the mean of `values[i + 1 - window..=i]`, or `None` when
/// fewer than `window` points precede it or any point in the window is
/// missing. A gap resets the running window.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::new(window)?;
    let mut out = Vec::with_capacity(values.len());

    for value in values {
        match value {
            Some(v) => {
                sma.update(*v);
                out.push(sma.value().ok());
            }
            None => {
                sma.reset();
                out.push(None);
            }
        }
    }

    Ok(out)
}

/// Centered moving average of length `period`.
///
/// For an even period this is the 2×m average (half weights on the two end
/// points), matching classical decomposition. The first and last
/// `period / 2` positions are `None`.
pub fn centered_moving_average(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period < 2 {
        return Err(MathError::InvalidInput(
            "Centered moving average needs a period of at least 2".to_string(),
        ));
    }

    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };

    let half = weights.len() / 2;
    if values.len() < weights.len() {
        return Err(MathError::InsufficientData(format!(
            "Centered moving average of period {} needs {} values, have {}",
            period,
            weights.len(),
            values.len()
        )));
    }

    let mut out = vec![None; values.len()];
    for center in half..values.len() - half {
        let start = center - half;
        let avg = weights
            .iter()
            .zip(&values[start..start + weights.len()])
            .map(|(w, v)| w * v)
            .sum::<f64>();
        out[center] = Some(avg);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_calculation() {
        let mut sma = SimpleMovingAverage::new(3).unwrap();

        // Not enough data yet
        assert!(sma.value().is_err());

        sma.update(2.0);
        sma.update(4.0);
        assert!(sma.value().is_err());

        sma.update(6.0);
        assert_eq!(sma.value().unwrap(), 4.0);

        // The window slides, dropping the oldest value
        sma.update(8.0);
        assert_eq!(sma.value().unwrap(), 6.0);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(SimpleMovingAverage::new(0).is_err());
        assert!(rolling_mean(&[Some(1.0)], 0).is_err());
    }

    #[test]
    fn test_rolling_mean_with_gap() {
        let values = [Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0)];
        let rolled = rolling_mean(&values, 2).unwrap();

        assert_eq!(rolled[0], None);
        assert_eq!(rolled[1], Some(1.5));
        assert_eq!(rolled[2], Some(2.5));
        assert_eq!(rolled[3], None);
        assert_eq!(rolled[4], None);
        assert_eq!(rolled[5], Some(5.5));
    }

    #[test]
    fn test_centered_even_period() {
        let values: Vec<f64> = (0..8).map(|v| v as f64).collect();
        let trend = centered_moving_average(&values, 4).unwrap();

        assert_eq!(trend[0], None);
        assert_eq!(trend[1], None);
        // A linear series is reproduced exactly by a symmetric filter
        assert_relative_eq!(trend[2].unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(trend[5].unwrap(), 5.0, epsilon = 1e-12);
        assert_eq!(trend[6], None);
        assert_eq!(trend[7], None);
    }

    #[test]
    fn test_centered_odd_period() {
        let values = [3.0, 6.0, 9.0, 12.0];
        let trend = centered_moving_average(&values, 3).unwrap();
        assert_eq!(trend[0], None);
        assert_relative_eq!(trend[1].unwrap(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(trend[2].unwrap(), 9.0, epsilon = 1e-12);
        assert_eq!(trend[3], None);
    }
}
