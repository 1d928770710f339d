//! Pipeline configuration
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. [`PipelineConfig::validate`] enforces the parameter ranges
//! the dashboard offers.

use crate::eda::{DecompositionKind, DEFAULT_OUTLIER_K};
use crate::error::{ForecastError, Result};
use crate::models::ModelSpec;
use crate::split::DEFAULT_HORIZON;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

// ============================================================================
// Parameter ranges
// ============================================================================

const WINDOW_RANGE: RangeInclusive<usize> = 2..=12;
const ARIMA_ORDER_RANGE: RangeInclusive<usize> = 0..=5;
const DIFFERENCING_RANGE: RangeInclusive<usize> = 0..=2;
const SARIMA_ORDER_RANGE: RangeInclusive<usize> = 0..=3;
const SEASONAL_ORDER_RANGE: RangeInclusive<usize> = 0..=2;
const SEASONAL_DIFFERENCING_RANGE: RangeInclusive<usize> = 0..=1;
const SEASON_LENGTH_RANGE: RangeInclusive<usize> = 2..=24;

// ============================================================================
// Pipeline Configuration
// ============================================================================

/// Configuration for loading, exploring and forecasting a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file with `date` and `shipped_qty` columns
    pub data_path: PathBuf,
    /// Number of held-out months
    pub horizon: usize,
    /// Model and its parameters
    pub model: ModelSpec,
    /// IQR fence multiplier for outlier detection
    pub outlier_k: f64,
    /// Decomposition type for exploration
    pub decomposition: DecompositionKind,
    /// Season length used for exploration
    pub seasonal_period: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/shipping_history.csv"),
            horizon: DEFAULT_HORIZON,
            model: ModelSpec::default(),
            outlier_k: DEFAULT_OUTLIER_K,
            decomposition: DecompositionKind::Additive,
            seasonal_period: 12,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON configuration and validate it
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter against its allowed range
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }
        if !self.outlier_k.is_finite() || self.outlier_k < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "outlier_k must be finite and non-negative, got {}",
                self.outlier_k
            )));
        }
        check_range("seasonal_period", self.seasonal_period, &SEASON_LENGTH_RANGE)?;

        validate_model(&self.model)
    }
}

/// Check a model's parameters against the dashboard ranges
pub fn validate_model(model: &ModelSpec) -> Result<()> {
    model.validate()?;

    match model {
        ModelSpec::MovingAverage(m) => check_range("window", m.window, &WINDOW_RANGE),
        ModelSpec::Arima(m) => {
            check_range("p", m.p, &ARIMA_ORDER_RANGE)?;
            check_range("d", m.d, &DIFFERENCING_RANGE)?;
            check_range("q", m.q, &ARIMA_ORDER_RANGE)
        }
        ModelSpec::Sarima(m) => {
            check_range("p", m.p, &SARIMA_ORDER_RANGE)?;
            check_range("d", m.d, &DIFFERENCING_RANGE)?;
            check_range("q", m.q, &SARIMA_ORDER_RANGE)?;
            check_range("seasonal_p", m.big_p, &SEASONAL_ORDER_RANGE)?;
            check_range("seasonal_d", m.big_d, &SEASONAL_DIFFERENCING_RANGE)?;
            check_range("seasonal_q", m.big_q, &SEASONAL_ORDER_RANGE)?;
            check_range("s", m.s, &SEASON_LENGTH_RANGE)
        }
        ModelSpec::HoltWinters(m) => {
            check_range("seasonal_periods", m.seasonal_periods, &SEASON_LENGTH_RANGE)
        }
        ModelSpec::Prophet(_) => Ok(()),
    }
}

fn check_range(name: &str, value: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}
