//! # Ship Math
//!
//! Numeric building blocks used by the shipment forecasting crate.
//! Nothing in here knows about dates or shipments; every function works on
//! plain `f64` slices.

use thiserror::Error;

pub mod differencing;
pub mod linalg;
pub mod moving_averages;
pub mod optimization;
pub mod stats;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
