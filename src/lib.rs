//! # Shipcast workspace
//!
//! Umbrella crate for the shipment forecasting workspace. It re-exports the
//! forecasting crate and its numeric building blocks so that a single
//! dependency pulls in both.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use shipcast_workspace::{forecast_and_score, ModelSpec, TimeSeries};
//!
//! let values: Vec<f64> = (100..112).map(f64::from).collect();
//! let series = TimeSeries::from_values(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), &values).unwrap();
//!
//! let metrics = forecast_and_score(&series, &ModelSpec::default(), 3).unwrap();
//! assert_eq!(metrics.mae, 3.0);
//! ```

pub use ship_math;
pub use shipcast;

pub use shipcast::{
    evaluate, split, EvaluationResult, Forecast, ForecastError, ModelKind, ModelSpec, Pipeline,
    PipelineConfig, SessionCache, SessionId, TimeSeries,
};

/// Hold out `horizon` months, forecast them with `spec` and score the forecast.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use shipcast_workspace::{forecast_and_score, ForecastError, ModelSpec, TimeSeries};
///
/// let series = TimeSeries::from_values(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), &[1.0, 2.0]).unwrap();
/// let result = forecast_and_score(&series, &ModelSpec::default(), 2);
/// assert!(matches!(result, Err(ForecastError::InvalidHorizonError { .. })));
/// ```
pub fn forecast_and_score(
    series: &TimeSeries,
    spec: &ModelSpec,
    horizon: usize,
) -> shipcast::error::Result<EvaluationResult> {
    let parts = split(series.as_slice(), horizon)?;
    let forecast = spec.forecast(parts.train, parts.horizon())?;
    evaluate(parts.test, &forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn constant(value: f64, n: usize) -> TimeSeries {
        TimeSeries::from_values(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(), &vec![value; n])
            .unwrap()
    }

    #[test]
    fn test_constant_series_scores_zero() {
        let metrics = forecast_and_score(&constant(42.0, 12), &ModelSpec::default(), 3).unwrap();
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, 0.0);
    }

    #[test]
    fn test_math_reexport() {
        assert_eq!(ship_math::stats::mean(&[1.0, 3.0]).unwrap(), 2.0);
    }
}
