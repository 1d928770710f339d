//! Forecasting models for monthly series
//!
//! Every model implements [`ForecastModel`]. [`ModelSpec`] is the closed set
//! of models the dashboard offers; [`ModelSpec::forecast`] dispatches on the
//! tag and checks the output against the forecast contract.

use crate::error::{ForecastError, Result};
use crate::series::{following_months, format_month, SeriesSlice};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

pub mod arima;
pub mod holt_winters;
pub mod moving_average;
pub mod prophet;
pub mod sarima;

pub use arima::Arima;
pub use holt_winters::{Component, HoltWinters};
pub use moving_average::MovingAverage;
pub use prophet::Prophet;
pub use sarima::Sarima;

/// Which family a forecast came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    MovingAverage,
    Arima,
    Sarima,
    HoltWinters,
    Prophet,
}

impl ModelKind {
    /// All kinds in menu order
    pub const ALL: [ModelKind; 5] = [
        ModelKind::MovingAverage,
        ModelKind::Arima,
        ModelKind::Sarima,
        ModelKind::HoltWinters,
        ModelKind::Prophet,
    ];
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModelKind::MovingAverage => "Moving Average",
            ModelKind::Arima => "ARIMA",
            ModelKind::Sarima => "SARIMA",
            ModelKind::HoltWinters => "Holt-Winters",
            ModelKind::Prophet => "Prophet",
        };
        f.write_str(label)
    }
}

/// A single forecast month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Month start
    pub month: NaiveDate,
    /// Point forecast
    pub forecast: f64,
}

/// Point forecasts for the months following a training series
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    model: ModelKind,
    points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Attach `values` to the months immediately after `train`
    pub fn after(model: ModelKind, train: SeriesSlice<'_>, values: Vec<f64>) -> Result<Self> {
        let last = train.last_month().ok_or_else(|| {
            ForecastError::EmptySeriesError("Cannot forecast from an empty series".to_string())
        })?;
        let months = following_months(last, values.len())?;

        Ok(Self {
            model,
            points: months
                .into_iter()
                .zip(values)
                .map(|(month, forecast)| ForecastPoint { month, forecast })
                .collect(),
        })
    }

    /// Rebuild from stored points
    pub fn from_points(model: ModelKind, points: Vec<ForecastPoint>) -> Self {
        Self { model, points }
    }

    /// Model that produced this forecast
    pub fn model(&self) -> ModelKind {
        self.model
    }

    /// The forecast points
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Forecast values in order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.forecast).collect()
    }

    /// Forecast months in order
    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    /// Number of forecast months
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    /// Verify length, months and finiteness against the training series
    pub fn check_contract(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<()> {
        let violation = |reason: String| ForecastError::ContractViolation {
            model: self.model,
            reason,
        };

        if self.points.len() != horizon {
            return Err(violation(format!(
                "expected {} points, got {}",
                horizon,
                self.points.len()
            )));
        }

        let last = train.last_month().ok_or_else(|| violation("empty training series".to_string()))?;
        let expected = following_months(last, horizon)?;
        for (point, month) in self.points.iter().zip(expected) {
            if point.month != month {
                return Err(violation(format!(
                    "expected month {}, got {}",
                    format_month(month),
                    format_month(point.month)
                )));
            }
            if !point.forecast.is_finite() {
                return Err(violation(format!(
                    "non-finite forecast for {}",
                    format_month(point.month)
                )));
            }
        }

        Ok(())
    }
}

/// Common interface for forecasting models
pub trait ForecastModel: fmt::Debug + Clone {
    /// Family of the model
    fn kind(&self) -> ModelKind;

    /// Human-readable name including parameters
    fn name(&self) -> String;

    /// Check that the parameters are usable
    fn validate(&self) -> Result<()>;

    /// Forecast the `horizon` months after the last month of `train`
    fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast>;
}

/// A model choice together with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSpec {
    MovingAverage(MovingAverage),
    Arima(Arima),
    Sarima(Sarima),
    HoltWinters(HoltWinters),
    Prophet(Prophet),
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::MovingAverage(MovingAverage::default())
    }
}

impl ModelSpec {
    /// Default parameters for a kind
    pub fn default_for(kind: ModelKind) -> Self {
        match kind {
            ModelKind::MovingAverage => ModelSpec::MovingAverage(MovingAverage::default()),
            ModelKind::Arima => ModelSpec::Arima(Arima::default()),
            ModelKind::Sarima => ModelSpec::Sarima(Sarima::default()),
            ModelKind::HoltWinters => ModelSpec::HoltWinters(HoltWinters::default()),
            ModelKind::Prophet => ModelSpec::Prophet(Prophet::default()),
        }
    }

    /// Family of the selected model
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelSpec::MovingAverage(m) => m.kind(),
            ModelSpec::Arima(m) => m.kind(),
            ModelSpec::Sarima(m) => m.kind(),
            ModelSpec::HoltWinters(m) => m.kind(),
            ModelSpec::Prophet(m) => m.kind(),
        }
    }

    /// Name of the selected model with its parameters
    pub fn name(&self) -> String {
        match self {
            ModelSpec::MovingAverage(m) => m.name(),
            ModelSpec::Arima(m) => m.name(),
            ModelSpec::Sarima(m) => m.name(),
            ModelSpec::HoltWinters(m) => m.name(),
            ModelSpec::Prophet(m) => m.name(),
        }
    }

    /// Check the selected model's parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelSpec::MovingAverage(m) => m.validate(),
            ModelSpec::Arima(m) => m.validate(),
            ModelSpec::Sarima(m) => m.validate(),
            ModelSpec::HoltWinters(m) => m.validate(),
            ModelSpec::Prophet(m) => m.validate(),
        }
    }

    /// Run the selected model and enforce the forecast contract
    pub fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizonError {
                horizon,
                len: train.len(),
            });
        }
        if train.is_empty() {
            return Err(ForecastError::EmptySeriesError(
                "Cannot forecast from an empty series".to_string(),
            ));
        }

        let result = match self {
            ModelSpec::MovingAverage(m) => m.forecast(train, horizon),
            ModelSpec::Arima(m) => m.forecast(train, horizon),
            ModelSpec::Sarima(m) => m.forecast(train, horizon),
            ModelSpec::HoltWinters(m) => m.forecast(train, horizon),
            ModelSpec::Prophet(m) => m.forecast(train, horizon),
        };

        let forecast = match result {
            Ok(forecast) => forecast,
            Err(err) => {
                warn!(model = %self.name(), error = %err, "forecast failed");
                return Err(err);
            }
        };
        forecast.check_contract(train, horizon)?;

        info!(model = %self.name(), horizon, train_len = train.len(), "forecast produced");
        Ok(forecast)
    }
}

/// Values ready for fitting, rejecting series with nothing recorded
pub(crate) fn fitting_values(model: ModelKind, train: SeriesSlice<'_>, needed: usize) -> Result<Vec<f64>> {
    let values = train.filled_values();
    if values.len() < needed {
        return Err(ForecastError::insufficient(model, needed, values.len()));
    }
    Ok(values)
}
