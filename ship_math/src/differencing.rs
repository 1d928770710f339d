//! Lag differencing and its inverse
//!
//! A differencing chain applies one lag difference per entry, in order.
//! ARIMA uses `[1; d]`, seasonal ARIMA prepends `[s; D]`.

use crate::{MathError, Result};

/// Lag difference: `out[t] = values[t + lag] - values[t]`
pub fn difference(values: &[f64], lag: usize) -> Result<Vec<f64>> {
    if lag == 0 {
        return Err(MathError::InvalidInput(
            "Differencing lag must be positive".to_string(),
        ));
    }
    if values.len() <= lag {
        return Err(MathError::InsufficientData(format!(
            "Lag-{} differencing needs more than {} values, have {}",
            lag,
            lag,
            values.len()
        )));
    }

    Ok(values
        .iter()
        .skip(lag)
        .zip(values.iter())
        .map(|(later, earlier)| later - earlier)
        .collect())
}

/// Every intermediate stage of a differencing chain.
///
/// `stages[0]` is the input and `stages[i + 1]` is `stages[i]` differenced at
/// `lags[i]`. The last stage is the fully differenced series.
#[derive(Debug, Clone)]
pub struct DifferencingChain {
    lags: Vec<usize>,
    stages: Vec<Vec<f64>>,
}

impl DifferencingChain {
    /// Apply each lag in turn
    pub fn apply(values: &[f64], lags: &[usize]) -> Result<Self> {
        let mut stages = Vec::with_capacity(lags.len() + 1);
        stages.push(values.to_vec());

        for &lag in lags {
            let next = difference(&stages[stages.len() - 1], lag)?;
            stages.push(next);
        }

        Ok(Self {
            lags: lags.to_vec(),
            stages,
        })
    }

    /// Number of observations lost to differencing
    pub fn loss(lags: &[usize]) -> usize {
        lags.iter().sum()
    }

    /// The fully differenced series
    pub fn differenced(&self) -> &[f64] {
        &self.stages[self.stages.len() - 1]
    }

    /// Map values forecast on the differenced scale back to the input scale
    pub fn integrate(&self, forecast: &[f64]) -> Vec<f64> {
        let mut current = forecast.to_vec();

        for (stage, &lag) in self.stages.iter().zip(&self.lags).rev() {
            let mut extended = stage.clone();
            for value in &current {
                let base = extended[extended.len() - lag];
                extended.push(value + base);
            }
            current = extended[stage.len()..].to_vec();
        }

        current
    }
}
