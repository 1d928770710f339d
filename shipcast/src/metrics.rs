//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ModelKind};
use crate::series::{format_month, SeriesSlice};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Accuracy of a forecast over the test window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
}

impl std::fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        Ok(())
    }
}

/// One month of the actual-versus-forecast table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Month start
    pub month: NaiveDate,
    /// Observed value
    pub actual: f64,
    /// Forecast value
    pub forecast: f64,
}

impl ComparisonRow {
    /// Actual minus forecast
    pub fn error(&self) -> f64 {
        self.actual - self.forecast
    }
}

/// Full outcome of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Model family
    pub model: ModelKind,
    /// Scalar metrics
    pub metrics: EvaluationResult,
    /// Month-by-month comparison
    pub comparison: Vec<ComparisonRow>,
}

/// Pair actual values with forecast values month by month.
///
/// The months must match exactly and in order, and every actual must be
/// recorded.
pub fn align(actual: SeriesSlice<'_>, forecast: &Forecast) -> Result<Vec<ComparisonRow>> {
    if actual.is_empty() || forecast.horizon() == 0 {
        return Err(ForecastError::AlignmentError(
            "Cannot evaluate an empty window".to_string(),
        ));
    }
    if actual.len() != forecast.horizon() {
        return Err(ForecastError::AlignmentError(format!(
            "Actual window has {} months but forecast has {}",
            actual.len(),
            forecast.horizon()
        )));
    }

    actual
        .observations()
        .iter()
        .zip(forecast.points())
        .map(|(obs, point)| {
            if obs.month != point.month {
                return Err(ForecastError::AlignmentError(format!(
                    "Actual month {} does not match forecast month {}",
                    format_month(obs.month),
                    format_month(point.month)
                )));
            }
            let value = obs.value.ok_or_else(|| {
                ForecastError::DataFormatError(format!(
                    "No actual value recorded for {}",
                    format_month(obs.month)
                ))
            })?;
            Ok(ComparisonRow {
                month: obs.month,
                actual: value,
                forecast: point.forecast,
            })
        })
        .collect()
}

/// Compute MAE, RMSE and MAPE over aligned rows.
///
/// An actual of zero makes MAPE undefined and is rejected.
pub fn accuracy(rows: &[ComparisonRow]) -> Result<EvaluationResult> {
    if rows.is_empty() {
        return Err(ForecastError::AlignmentError(
            "Cannot evaluate an empty window".to_string(),
        ));
    }
    if let Some(zero) = rows.iter().find(|r| r.actual == 0.0) {
        return Err(ForecastError::DivisionByZeroError { month: zero.month });
    }

    let n = rows.len() as f64;

    let mae = rows.iter().map(|r| r.error().abs()).sum::<f64>() / n;
    let mse = rows.iter().map(|r| r.error().powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();
    let mape = rows
        .iter()
        .map(|r| (r.error() / r.actual).abs())
        .sum::<f64>()
        / n
        * 100.0;

    Ok(EvaluationResult { mae, rmse, mape })
}

/// Evaluate a forecast against the actual values of the same months
pub fn evaluate(actual: SeriesSlice<'_>, forecast: &Forecast) -> Result<EvaluationResult> {
    let rows = align(actual, forecast)?;
    accuracy(&rows)
}

/// Evaluate and keep the comparison table
pub fn evaluate_report(actual: SeriesSlice<'_>, forecast: &Forecast) -> Result<EvaluationReport> {
    let comparison = align(actual, forecast)?;
    let metrics = accuracy(&comparison)?;

    info!(
        model = %forecast.model(),
        mae = metrics.mae,
        rmse = metrics.rmse,
        mape = metrics.mape,
        "forecast evaluated"
    );

    Ok(EvaluationReport {
        model: forecast.model(),
        metrics,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Observation, TimeSeries};
    use approx::assert_relative_eq;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, 1).unwrap()
    }

    fn row(m: u32, actual: f64, forecast: f64) -> ComparisonRow {
        ComparisonRow {
            month: month(m),
            actual,
            forecast,
        }
    }

    #[test]
    fn test_accuracy() {
        let rows = vec![row(1, 100.0, 90.0), row(2, 200.0, 220.0)];
        let result = accuracy(&rows).unwrap();

        assert_relative_eq!(result.mae, 15.0);
        assert_relative_eq!(result.rmse, (250.0f64).sqrt());
        assert_relative_eq!(result.mape, 10.0);
    }

    #[test]
    fn test_zero_actual_rejected() {
        let rows = vec![row(1, 100.0, 90.0), row(2, 0.0, 5.0)];
        match accuracy(&rows) {
            Err(ForecastError::DivisionByZeroError { month: m }) => assert_eq!(m, month(2)),
            other => panic!("expected DivisionByZeroError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_actual_rejected() {
        let points = vec![
            Observation::new(month(1), Some(1.0)),
            Observation::new(month(2), None),
        ];
        let actual = TimeSeries::from_observations(points).unwrap();
        let forecast = Forecast::from_points(
            ModelKind::MovingAverage,
            vec![
                crate::models::ForecastPoint { month: month(1), forecast: 1.0 },
                crate::models::ForecastPoint { month: month(2), forecast: 1.0 },
            ],
        );

        assert!(matches!(
            evaluate(actual.as_slice(), &forecast),
            Err(ForecastError::DataFormatError(_))
        ));
    }

    #[test]
    fn test_display() {
        let text = EvaluationResult { mae: 1.0, rmse: 2.0, mape: 3.0 }.to_string();
        assert!(text.contains("MAE:   1.0000"));
        assert!(text.contains("MAPE:  3.0000%"));
    }
}
