//! Moving average baseline

use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ForecastModel, ModelKind};
use crate::series::SeriesSlice;
use serde::{Deserialize, Serialize};
use ship_math::moving_averages::rolling_mean;
use tracing::debug;

/// Repeats the mean of the last `window` months over the whole horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverage {
    /// Number of trailing months averaged
    pub window: usize,
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self { window: 3 }
    }
}

impl MovingAverage {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        let model = Self { window };
        model.validate()?;
        Ok(model)
    }
}

impl ForecastModel for MovingAverage {
    fn kind(&self) -> ModelKind {
        ModelKind::MovingAverage
    }

    fn name(&self) -> String {
        format!("Moving Average (window={})", self.window)
    }

    fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast> {
        self.validate()?;
        if train.len() < self.window {
            return Err(ForecastError::insufficient(self.kind(), self.window, train.len()));
        }

        // The rolling mean is undefined when the trailing window has a gap
        let rolled = rolling_mean(&train.values(), self.window)?;
        let level = match rolled.last().copied().flatten() {
            Some(level) => level,
            None => {
                let tail = train.slice(train.len() - self.window, train.len());
                return Err(ForecastError::insufficient(
                    self.kind(),
                    self.window,
                    self.window - tail.missing_count(),
                ));
            }
        };

        debug!(window = self.window, level, "moving average level");
        Forecast::after(self.kind(), train, vec![level; horizon])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Observation, TimeSeries};
    use chrono::NaiveDate;

    fn jan(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    #[test]
    fn test_repeats_trailing_mean() {
        let series = TimeSeries::from_values(jan(2023), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let forecast = MovingAverage::new(3).unwrap().forecast(series.as_slice(), 2).unwrap();
        assert_eq!(forecast.values(), vec![5.0, 5.0]);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            MovingAverage::new(0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_short_series() {
        let series = TimeSeries::from_values(jan(2023), &[1.0, 2.0]).unwrap();
        match MovingAverage::new(3).unwrap().forecast(series.as_slice(), 1) {
            Err(ForecastError::InsufficientDataError { needed, got, .. }) => {
                assert_eq!(needed, 3);
                assert_eq!(got, 2);
            }
            other => panic!("expected InsufficientDataError, got {:?}", other),
        }
    }

    #[test]
    fn test_gap_in_window() {
        let points = vec![
            Observation::new(jan(2023), Some(1.0)),
            Observation::new(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(), None),
            Observation::new(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(), Some(3.0)),
        ];
        let series = TimeSeries::from_observations(points).unwrap();
        assert!(matches!(
            MovingAverage::new(2).unwrap().forecast(series.as_slice(), 1),
            Err(ForecastError::InsufficientDataError { got: 1, .. })
        ));
    }
}
