//! # Shipcast
//!
//! Monthly shipment forecasting: load a shipment history, explore it, hold
//! out the last few months, forecast them with one of several models and
//! score the forecast.
//!
//! ## Features
//!
//! - CSV loading into a gap-aware monthly series (`date`, `shipped_qty`)
//! - Train/test split on a fixed horizon
//! - Forecasting models (Moving Average, ARIMA, SARIMA, Holt-Winters, Prophet)
//! - MAE, RMSE and MAPE evaluation with a month-by-month comparison table
//! - IQR outlier detection and classical decomposition
//! - A per-session forecast cache so evaluation reuses the last forecast
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use shipcast::models::{ModelSpec, MovingAverage};
//! use shipcast::{evaluate, split, TimeSeries};
//!
//! let values: Vec<f64> = (100..112).map(f64::from).collect();
//! let series = TimeSeries::from_values(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), &values)?;
//!
//! let parts = split(series.as_slice(), 3)?;
//! let spec = ModelSpec::MovingAverage(MovingAverage::new(3)?);
//! let forecast = spec.forecast(parts.train, parts.horizon())?;
//! assert_eq!(forecast.values(), vec![107.0, 107.0, 107.0]);
//!
//! let metrics = evaluate(parts.test, &forecast)?;
//! assert_eq!(metrics.mae, 3.0);
//! # Ok::<(), shipcast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod eda;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod series;
pub mod session;
pub mod split;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::SeriesStore;
pub use crate::error::{ForecastError, PipelineError};
pub use crate::metrics::{evaluate, EvaluationReport, EvaluationResult};
pub use crate::models::{Forecast, ForecastModel, ModelKind, ModelSpec};
pub use crate::pipeline::{Pipeline, Stage};
pub use crate::series::{SeriesSlice, TimeSeries};
pub use crate::session::{SessionCache, SessionId};
pub use crate::split::{split, Split};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
