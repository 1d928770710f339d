//! Error types for the shipcast crate

use crate::models::ModelKind;
use crate::pipeline::Stage;
use crate::session::SessionId;
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the shipcast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input is missing a required column or holds unparseable values
    #[error("Data format error: {0}")]
    DataFormatError(String),

    /// Loading produced no rows
    #[error("Empty series: {0}")]
    EmptySeriesError(String),

    /// Horizon is zero or does not leave any training data
    #[error("Invalid horizon {horizon} for a series of length {len}")]
    InvalidHorizonError { horizon: usize, len: usize },

    /// Too few observations for the requested computation
    #[error("Insufficient data for {subject}: need at least {needed} observations, got {got}")]
    InsufficientDataError {
        subject: String,
        needed: usize,
        got: usize,
    },

    /// A model failed to fit
    #[error("{model} fit failed: {reason}")]
    FitError { model: ModelKind, reason: String },

    /// Actual and forecast months do not line up
    #[error("Alignment error: {0}")]
    AlignmentError(String),

    /// MAPE is undefined because an actual value is zero
    #[error("Division by zero: actual value is zero for {month}")]
    DivisionByZeroError { month: NaiveDate },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A forecaster returned the wrong number of points or wrong months
    #[error("{model} violated the forecast contract: {reason}")]
    ContractViolation { model: ModelKind, reason: String },

    /// Evaluation was requested before any forecast was produced
    #[error("No forecast cached for session '{0}'")]
    NoCachedForecast(SessionId),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV exports
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading configuration or writing JSON reports
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from numeric building blocks
    #[error("Math error: {0}")]
    MathError(#[from] ship_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

/// A failure inside the pipeline, tagged with where it happened
#[derive(Debug, Error)]
#[error("{stage} failed{}: {source}", for_model(.model))]
pub struct PipelineError {
    /// Stage that failed
    pub stage: Stage,
    /// Model involved, if the stage ran one
    pub model: Option<ModelKind>,
    /// Underlying error
    #[source]
    pub source: ForecastError,
}

impl PipelineError {
    /// Wrap an error raised in `stage`
    pub fn new(stage: Stage, model: Option<ModelKind>, source: ForecastError) -> Self {
        Self {
            stage,
            model,
            source,
        }
    }
}

fn for_model(model: &Option<ModelKind>) -> String {
    model.map(|m| format!(" for {}", m)).unwrap_or_default()
}

/// Result type for pipeline stages
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Shorthand for an insufficient-data error about a model
    pub(crate) fn insufficient(model: ModelKind, needed: usize, got: usize) -> Self {
        ForecastError::InsufficientDataError {
            subject: model.to_string(),
            needed,
            got,
        }
    }

    /// Shorthand for a fit failure
    pub(crate) fn fit(model: ModelKind, reason: impl Into<String>) -> Self {
        ForecastError::FitError {
            model,
            reason: reason.into(),
        }
    }
}
