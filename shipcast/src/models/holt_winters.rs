//! Holt-Winters exponential smoothing
//!
//! Level, trend and seasonal states are each updated by exponential
//! smoothing. The trend and seasonal components can be additive,
//! multiplicative or switched off. Smoothing weights are chosen by
//! minimising the in-sample one-step squared error.

use crate::error::{ForecastError, Result};
use crate::models::{fitting_values, Forecast, ForecastModel, ModelKind};
use crate::series::SeriesSlice;
use serde::{Deserialize, Serialize};
use ship_math::optimization::{nelder_mead, NelderMeadConfig};
use std::fmt;
use tracing::{debug, warn};

/// Bounds for every smoothing weight
const WEIGHT_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// How a trend or seasonal component combines with the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Additive,
    Multiplicative,
    None,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Component::Additive => "add",
            Component::Multiplicative => "mul",
            Component::None => "none",
        };
        f.write_str(label)
    }
}

/// Holt-Winters model configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoltWinters {
    /// Trend component
    pub trend: Component,
    /// Seasonal component
    pub seasonal: Component,
    /// Season length in months
    pub seasonal_periods: usize,
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self {
            trend: Component::Additive,
            seasonal: Component::Additive,
            seasonal_periods: 12,
        }
    }
}

impl HoltWinters {
    /// Create a new Holt-Winters model
    pub fn new(trend: Component, seasonal: Component, seasonal_periods: usize) -> Result<Self> {
        let model = Self {
            trend,
            seasonal,
            seasonal_periods,
        };
        model.validate()?;
        Ok(model)
    }

    /// Smallest training length the fit accepts, whatever the components
    pub fn min_length(&self) -> usize {
        2 * self.seasonal_periods
    }

    fn is_multiplicative(&self) -> bool {
        self.trend == Component::Multiplicative || self.seasonal == Component::Multiplicative
    }

    /// Expand the free weights into (α, β, γ); switched-off components get 0
    fn weights(&self, free: &[f64]) -> SmoothingWeights {
        let mut iter = free.iter().copied();
        let alpha = iter.next().unwrap_or(WEIGHT_BOUNDS.0);
        let beta = if self.trend == Component::None {
            0.0
        } else {
            iter.next().unwrap_or(WEIGHT_BOUNDS.0)
        };
        let gamma = if self.seasonal == Component::None {
            0.0
        } else {
            iter.next().unwrap_or(WEIGHT_BOUNDS.0)
        };
        SmoothingWeights { alpha, beta, gamma }
    }

    fn initial_weights(&self) -> Vec<f64> {
        let mut initial = vec![0.3];
        if self.trend != Component::None {
            initial.push(0.1);
        }
        if self.seasonal != Component::None {
            initial.push(0.1);
        }
        initial
    }

    /// Initial level, trend and seasonal indices from the first two seasons
    fn initial_state(&self, values: &[f64]) -> State {
        let m = self.seasonal_periods;
        let first = &values[..m];
        let second = &values[m..2 * m];
        let level = first.iter().sum::<f64>() / m as f64;
        let second_level = second.iter().sum::<f64>() / m as f64;

        let trend = match self.trend {
            Component::Additive => (second_level - level) / m as f64,
            Component::Multiplicative => (second_level / level).powf(1.0 / m as f64),
            Component::None => 0.0,
        };

        let mut seasonals: Vec<f64> = match self.seasonal {
            Component::Additive => first.iter().map(|y| y - level).collect(),
            Component::Multiplicative => first.iter().map(|y| y / level).collect(),
            Component::None => vec![0.0; m],
        };
        normalize_seasonals(&mut seasonals, self.seasonal);

        State {
            level,
            trend,
            seasonals,
        }
    }

    /// Run the smoothing recursions from the end of the first season.
    ///
    /// Returns the final state and the one-step squared error.
    fn smooth(&self, values: &[f64], weights: SmoothingWeights) -> (State, f64) {
        let m = self.seasonal_periods;
        let mut state = self.initial_state(values);
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate().skip(m) {
            let idx = t % m;
            let s = state.seasonals[idx];
            let base = state.base(self.trend, 1);

            let fitted = self.seasonalize(base, s);
            let error = y - fitted;
            sse += error * error;

            let deseasonalized = match self.seasonal {
                Component::Additive => y - s,
                Component::Multiplicative => y / s,
                Component::None => y,
            };

            let previous = state.level;
            state.level = weights.alpha * deseasonalized + (1.0 - weights.alpha) * base;
            state.trend = match self.trend {
                Component::Additive => {
                    weights.beta * (state.level - previous) + (1.0 - weights.beta) * state.trend
                }
                Component::Multiplicative => {
                    weights.beta * (state.level / previous) + (1.0 - weights.beta) * state.trend
                }
                Component::None => 0.0,
            };
            state.seasonals[idx] = match self.seasonal {
                Component::Additive => weights.gamma * (y - state.level) + (1.0 - weights.gamma) * s,
                Component::Multiplicative => {
                    weights.gamma * (y / state.level) + (1.0 - weights.gamma) * s
                }
                Component::None => 0.0,
            };
        }

        (state, sse)
    }

    fn seasonalize(&self, base: f64, s: f64) -> f64 {
        match self.seasonal {
            Component::Additive => base + s,
            Component::Multiplicative => base * s,
            Component::None => base,
        }
    }
}

impl ForecastModel for HoltWinters {
    fn kind(&self) -> ModelKind {
        ModelKind::HoltWinters
    }

    fn name(&self) -> String {
        format!(
            "Holt-Winters (trend={}, seasonal={}, periods={})",
            self.trend, self.seasonal, self.seasonal_periods
        )
    }

    fn validate(&self) -> Result<()> {
        if self.seasonal_periods < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal periods must be at least 2, got {}",
                self.seasonal_periods
            )));
        }
        Ok(())
    }

    fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast> {
        self.validate()?;
        let values = fitting_values(self.kind(), train, self.min_length())?;

        if self.is_multiplicative() && values.iter().any(|v| *v <= 0.0) {
            return Err(ForecastError::fit(
                self.kind(),
                "multiplicative components need strictly positive data",
            ));
        }

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-8,
            ..Default::default()
        };
        let bounds = vec![WEIGHT_BOUNDS; self.initial_weights().len()];
        let result = nelder_mead(
            |free| self.smooth(&values, self.weights(free)).1,
            &self.initial_weights(),
            Some(&bounds),
            config,
        );

        if !result.optimal_value.is_finite() {
            return Err(ForecastError::fit(self.kind(), "squared error is not finite"));
        }
        if !result.converged {
            warn!(
                iterations = result.iterations,
                "smoothing weights did not converge, using best point"
            );
        }

        let weights = self.weights(&result.optimal_point);
        debug!(
            alpha = weights.alpha,
            beta = weights.beta,
            gamma = weights.gamma,
            sse = result.optimal_value,
            "holt-winters weights"
        );

        let (state, _) = self.smooth(&values, weights);
        let n = values.len();
        let m = self.seasonal_periods;
        let forecast = (1..=horizon)
            .map(|h| {
                let s = state.seasonals[(n - 1 + h) % m];
                self.seasonalize(state.base(self.trend, h), s)
            })
            .collect();

        Forecast::after(self.kind(), train, forecast)
    }
}

#[derive(Debug, Clone, Copy)]
struct SmoothingWeights {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
}

impl State {
    /// Level projected `h` steps along the trend
    fn base(&self, trend: Component, h: usize) -> f64 {
        match trend {
            Component::Additive => self.level + h as f64 * self.trend,
            Component::Multiplicative => self.level * self.trend.powi(h as i32),
            Component::None => self.level,
        }
    }
}

/// Additive indices sum to 0, multiplicative indices average to 1
fn normalize_seasonals(seasonals: &mut [f64], seasonal: Component) {
    let m = seasonals.len() as f64;
    match seasonal {
        Component::Additive => {
            let shift = seasonals.iter().sum::<f64>() / m;
            seasonals.iter_mut().for_each(|s| *s -= shift);
        }
        Component::Multiplicative => {
            let mean = seasonals.iter().sum::<f64>() / m;
            if mean.abs() > 1e-10 {
                seasonals.iter_mut().for_each(|s| *s /= mean);
            }
        }
        Component::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_values(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(), values).unwrap()
    }

    fn seasonal(n: usize) -> Vec<f64> {
        let pattern = [10.0, -5.0, 20.0, -25.0];
        (0..n).map(|t| 200.0 + 2.0 * t as f64 + pattern[t % 4]).collect()
    }

    #[test]
    fn test_additive_tracks_trend_and_season() {
        let values = seasonal(24);
        let model = HoltWinters::new(Component::Additive, Component::Additive, 4).unwrap();
        let forecast = model.forecast(series(&values).as_slice(), 4).unwrap();

        let expected = seasonal(28)[24..].to_vec();
        for (got, want) in forecast.values().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 5.0);
        }
    }

    #[test]
    fn test_no_components_is_flat() {
        let values: Vec<f64> = (0..12).map(|t| 50.0 + (t % 3) as f64).collect();
        let model = HoltWinters::new(Component::None, Component::None, 2).unwrap();
        let forecast = model.forecast(series(&values).as_slice(), 3).unwrap();

        let predicted = forecast.values();
        assert!(predicted.iter().all(|v| (*v - predicted[0]).abs() < 1e-12));
    }

    #[test]
    fn test_needs_two_seasons() {
        let values = seasonal(7);
        let model = HoltWinters::new(Component::None, Component::None, 4).unwrap();
        match model.forecast(series(&values).as_slice(), 1) {
            Err(ForecastError::InsufficientDataError { needed, got, .. }) => {
                assert_eq!(needed, 8);
                assert_eq!(got, 7);
            }
            other => panic!("expected InsufficientDataError, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_period_rejected_before_fitting() {
        let model = HoltWinters {
            trend: Component::Additive,
            seasonal: Component::Additive,
            seasonal_periods: 0,
        };
        assert!(matches!(
            model.forecast(series(&seasonal(24)).as_slice(), 3),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_multiplicative_needs_positive_data() {
        let mut values = seasonal(16);
        values[3] = 0.0;
        let model = HoltWinters::new(Component::Additive, Component::Multiplicative, 4).unwrap();
        assert!(matches!(
            model.forecast(series(&values).as_slice(), 2),
            Err(ForecastError::FitError { model: ModelKind::HoltWinters, .. })
        ));
    }

    #[test]
    fn test_multiplicative_forecast_is_positive() {
        let values = seasonal(16);
        let model =
            HoltWinters::new(Component::Multiplicative, Component::Multiplicative, 4).unwrap();
        let forecast = model.forecast(series(&values).as_slice(), 4).unwrap();
        assert!(forecast.values().iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_normalize_seasonals() {
        let mut additive = vec![1.0, 2.0, 3.0];
        normalize_seasonals(&mut additive, Component::Additive);
        assert_relative_eq!(additive.iter().sum::<f64>(), 0.0, epsilon = 1e-12);

        let mut multiplicative = vec![1.0, 2.0, 3.0];
        normalize_seasonals(&mut multiplicative, Component::Multiplicative);
        assert_relative_eq!(multiplicative.iter().sum::<f64>() / 3.0, 1.0, epsilon = 1e-12);
    }
}
