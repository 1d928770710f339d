//! The dashboard's actions as one pipeline
//!
//! Load → explore → split → forecast → evaluate. Each action runs to
//! completion; a failure names the stage and, where relevant, the model.
//! The latest forecast of each session lives in a [`SessionCache`] that the
//! caller owns and passes in.

use crate::config::{validate_model, PipelineConfig};
use crate::data::SeriesStore;
use crate::eda::{decompose, detect_outliers, Decomposition, OutlierReport};
use crate::error::{ForecastError, PipelineError, PipelineResult};
use crate::metrics::{evaluate_report, EvaluationReport};
use crate::models::{Forecast, ModelSpec};
use crate::series::TimeSeries;
use crate::session::{SessionCache, SessionId};
use crate::split::{split, Split};
use std::fmt;
use tracing::{info, warn};

/// Pipeline stage, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Explore,
    Split,
    Forecast,
    Evaluate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Load => "load",
            Stage::Explore => "explore",
            Stage::Split => "split",
            Stage::Forecast => "forecast",
            Stage::Evaluate => "evaluate",
        };
        f.write_str(label)
    }
}

/// Outliers and decomposition of the loaded series
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    /// IQR outlier scan
    pub outliers: OutlierReport,
    /// Classical decomposition
    pub decomposition: Decomposition,
}

/// A loaded series together with its validated configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    series: TimeSeries,
}

impl Pipeline {
    /// Validate the configuration and load the series it points to
    pub fn load(config: PipelineConfig) -> PipelineResult<Self> {
        let at_load = |e: ForecastError| PipelineError::new(Stage::Load, None, e);

        config.validate().map_err(at_load)?;
        let series = SeriesStore::from_csv(&config.data_path).map_err(at_load)?;

        info!(
            path = %config.data_path.display(),
            months = series.len(),
            "series loaded"
        );
        Ok(Self { config, series })
    }

    /// Use an already loaded series
    pub fn from_series(config: PipelineConfig, series: TimeSeries) -> PipelineResult<Self> {
        config
            .validate()
            .map_err(|e| PipelineError::new(Stage::Load, None, e))?;
        Ok(Self { config, series })
    }

    /// The configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The loaded series
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// IQR outlier scan with the configured multiplier
    pub fn outliers(&self) -> PipelineResult<OutlierReport> {
        detect_outliers(self.series.as_slice(), self.config.outlier_k)
            .map_err(|e| PipelineError::new(Stage::Explore, None, e))
    }

    /// Decomposition with the configured type and period
    pub fn decomposition(&self) -> PipelineResult<Decomposition> {
        decompose(
            self.series.as_slice(),
            self.config.decomposition,
            self.config.seasonal_period,
        )
        .map_err(|e| PipelineError::new(Stage::Explore, None, e))
    }

    /// Outliers and decomposition together
    pub fn explore(&self) -> PipelineResult<Exploration> {
        let outliers = self.outliers()?;
        let decomposition = self.decomposition()?;

        info!(
            outliers = outliers.months.len(),
            period = decomposition.period,
            kind = %decomposition.kind,
            "series explored"
        );
        Ok(Exploration {
            outliers,
            decomposition,
        })
    }

    /// Hold out the configured horizon
    pub fn split(&self) -> PipelineResult<Split<'_>> {
        let parts = split(self.series.as_slice(), self.config.horizon)
            .map_err(|e| PipelineError::new(Stage::Split, None, e))?;

        info!(
            train = parts.train.len(),
            test = parts.test.len(),
            "series split"
        );
        Ok(parts)
    }

    /// Forecast the held-out months with `spec` and cache the result.
    ///
    /// A failure removes the session's cached forecast, so a later evaluation
    /// never scores a stale one.
    pub fn forecast(
        &self,
        cache: &mut SessionCache,
        session: &SessionId,
        spec: &ModelSpec,
    ) -> PipelineResult<Forecast> {
        let result = self.run_forecast(spec);

        match result {
            Ok(forecast) => {
                cache.store(session.clone(), forecast.clone());
                info!(%session, model = %spec.name(), "forecast cached");
                Ok(forecast)
            }
            Err(err) => {
                if cache.invalidate(session).is_some() {
                    warn!(%session, "dropped cached forecast after failed request");
                }
                warn!(%session, error = %err, "forecast request failed");
                Err(err)
            }
        }
    }

    fn run_forecast(&self, spec: &ModelSpec) -> PipelineResult<Forecast> {
        let model = Some(spec.kind());
        validate_model(spec).map_err(|e| PipelineError::new(Stage::Forecast, model, e))?;

        let parts = self.split()?;
        spec.forecast(parts.train, parts.horizon())
            .map_err(|e| PipelineError::new(Stage::Forecast, model, e))
    }

    /// Score the session's cached forecast against the held-out months
    pub fn evaluate(
        &self,
        cache: &SessionCache,
        session: &SessionId,
    ) -> PipelineResult<EvaluationReport> {
        let cached = cache.get(session).ok_or_else(|| {
            PipelineError::new(
                Stage::Evaluate,
                None,
                ForecastError::NoCachedForecast(session.clone()),
            )
        })?;

        let parts = self.split()?;
        evaluate_report(parts.test, &cached.forecast)
            .map_err(|e| PipelineError::new(Stage::Evaluate, Some(cached.model), e))
    }
}
