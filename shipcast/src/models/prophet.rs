//! Prophet-style additive regression
//!
//! A piecewise-linear trend with automatically placed changepoints plus a
//! yearly Fourier seasonality, fitted as a MAP estimate under Gaussian
//! priors. With Gaussian priors the MAP estimate is a ridge regression, so
//! the fit is a single linear solve and fully deterministic.

use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ForecastModel, ModelKind};
use crate::series::{following_months, SeriesSlice};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ship_math::linalg::ridge_regression;
use std::f64::consts::PI;
use tracing::debug;

/// Length of a year in days, as used for the Fourier terms
const YEAR_DAYS: f64 = 365.25;

/// Scale of the observation noise the prior scales are compared against
const NOISE_SCALE: f64 = 0.1;

/// Prior scale of the base growth rate and offset
const TREND_PRIOR_SCALE: f64 = 5.0;

/// Prophet model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prophet {
    /// Maximum number of potential changepoints
    pub n_changepoints: usize,
    /// Share of history in which changepoints are placed
    pub changepoint_range: f64,
    /// Prior scale of the changepoint rate adjustments
    pub changepoint_prior_scale: f64,
    /// Prior scale of the seasonal coefficients
    pub seasonality_prior_scale: f64,
    /// Number of Fourier pairs for the yearly seasonality
    pub yearly_order: usize,
}

impl Default for Prophet {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_order: 10,
        }
    }
}

impl Prophet {
    /// Indexes of the observations used as changepoints.
    ///
    /// Evenly spaced over the first `changepoint_range` of the history, the
    /// first observation excluded.
    fn changepoint_indexes(&self, n: usize) -> Vec<usize> {
        let hist_size = (n as f64 * self.changepoint_range).floor() as usize;
        let count = self.n_changepoints.min(hist_size.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last = (hist_size - 1) as f64;
        let mut indexes: Vec<usize> = (1..=count)
            .map(|k| (k as f64 * last / count as f64).round() as usize)
            .collect();
        indexes.dedup();
        indexes
    }

    fn penalties(&self, n_changepoints: usize) -> Vec<f64> {
        let trend = (NOISE_SCALE / TREND_PRIOR_SCALE).powi(2);
        let delta = (NOISE_SCALE / self.changepoint_prior_scale).powi(2);
        let beta = (NOISE_SCALE / self.seasonality_prior_scale).powi(2);

        let mut penalties = vec![trend, trend];
        penalties.extend(std::iter::repeat(delta).take(n_changepoints));
        penalties.extend(std::iter::repeat(beta).take(2 * self.yearly_order));
        penalties
    }
}

/// Maps dates onto the regression's design rows
struct Design {
    start: f64,
    span: f64,
    changepoints: Vec<f64>,
    yearly_order: usize,
}

impl Design {
    fn row(&self, month: NaiveDate) -> Vec<f64> {
        let days = days_since_epoch(month);
        let t = (days - self.start) / self.span;

        let mut row = Vec::with_capacity(2 + self.changepoints.len() + 2 * self.yearly_order);
        row.push(t);
        row.push(1.0);
        for cp in &self.changepoints {
            row.push((t - cp).max(0.0));
        }

        let x = days / YEAR_DAYS;
        for i in 1..=self.yearly_order {
            let angle = 2.0 * PI * i as f64 * x;
            row.push(angle.sin());
            row.push(angle.cos());
        }
        row
    }
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .map(|epoch| (date - epoch).num_days() as f64)
        .unwrap_or(0.0)
}

impl ForecastModel for Prophet {
    fn kind(&self) -> ModelKind {
        ModelKind::Prophet
    }

    fn name(&self) -> String {
        format!(
            "Prophet (changepoints={}, yearly order={})",
            self.n_changepoints, self.yearly_order
        )
    }

    fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Changepoint range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.seasonality_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Prior scales must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast> {
        self.validate()?;
        // Months with no value are left out of the fit
        let observed: Vec<(NaiveDate, f64)> = train
            .observations()
            .iter()
            .filter_map(|o| o.value.map(|v| (o.month, v)))
            .collect();
        if observed.len() < 2 {
            return Err(ForecastError::insufficient(self.kind(), 2, observed.len()));
        }

        let start = days_since_epoch(observed[0].0);
        let span = days_since_epoch(observed[observed.len() - 1].0) - start;
        let y_scale = observed
            .iter()
            .map(|(_, y)| y.abs())
            .fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let mut design = Design {
            start,
            span,
            changepoints: Vec::new(),
            yearly_order: self.yearly_order,
        };
        design.changepoints = self
            .changepoint_indexes(observed.len())
            .into_iter()
            .map(|i| (days_since_epoch(observed[i].0) - start) / span)
            .collect();

        let rows: Vec<Vec<f64>> = observed.iter().map(|(month, _)| design.row(*month)).collect();
        let y: Vec<f64> = observed.iter().map(|(_, v)| v / y_scale).collect();
        let penalties = self.penalties(design.changepoints.len());

        let beta = ridge_regression(&rows, &y, &penalties)
            .map_err(|e| ForecastError::fit(self.kind(), e.to_string()))?;

        debug!(
            changepoints = design.changepoints.len(),
            growth = beta[0] * y_scale,
            offset = beta[1] * y_scale,
            "prophet fit"
        );

        // Predict over the history plus the horizon and keep the tail
        let last = train.last_month().ok_or_else(|| {
            ForecastError::EmptySeriesError("Cannot forecast from an empty series".to_string())
        })?;
        let mut frame = train.months();
        frame.extend(following_months(last, horizon)?);

        let predictions: Vec<f64> = frame
            .iter()
            .map(|month| {
                design
                    .row(*month)
                    .iter()
                    .zip(&beta)
                    .map(|(x, b)| x * b)
                    .sum::<f64>()
                    * y_scale
            })
            .collect();

        let tail = predictions[predictions.len() - horizon..].to_vec();
        Forecast::after(self.kind(), train, tail)
    }
}
