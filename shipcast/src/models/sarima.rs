//! Seasonal ARIMA

use crate::error::{ForecastError, Result};
use crate::models::arima::{forecast_differenced, ArmaOrders};
use crate::models::{fitting_values, Forecast, ForecastModel, ModelKind};
use crate::series::SeriesSlice;
use serde::{Deserialize, Serialize};

/// SARIMA(p, d, q)(P, D, Q, s)
///
/// Seasonal differencing at lag `s` is applied `D` times before `d` regular
/// differences. The AR and MA polynomials are multiplicative and expanded to a
/// single set of lags; no constant is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sarima {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving average order
    pub q: usize,
    /// Seasonal autoregressive order
    #[serde(rename = "seasonal_p")]
    pub big_p: usize,
    /// Seasonal differencing order
    #[serde(rename = "seasonal_d")]
    pub big_d: usize,
    /// Seasonal moving average order
    #[serde(rename = "seasonal_q")]
    pub big_q: usize,
    /// Season length in months
    pub s: usize,
}

impl Default for Sarima {
    fn default() -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            big_p: 1,
            big_d: 1,
            big_q: 1,
            s: 12,
        }
    }
}

impl Sarima {
    /// Create a new SARIMA model
    pub fn new(order: (usize, usize, usize), seasonal: (usize, usize, usize, usize)) -> Result<Self> {
        let (p, d, q) = order;
        let (big_p, big_d, big_q, s) = seasonal;
        let model = Self {
            p,
            d,
            q,
            big_p,
            big_d,
            big_q,
            s,
        };
        model.validate()?;
        Ok(model)
    }

    fn orders(&self) -> ArmaOrders {
        ArmaOrders {
            p: self.p,
            q: self.q,
            seasonal_p: self.big_p,
            seasonal_q: self.big_q,
            period: self.s,
            constant: false,
        }
    }

    /// Seasonal lags first, then regular lags
    fn lags(&self) -> Vec<usize> {
        let mut lags = vec![self.s; self.big_d];
        lags.extend(std::iter::repeat(1).take(self.d));
        lags
    }

    /// Smallest training length the fit accepts
    pub fn min_length(&self) -> usize {
        self.big_d * self.s + self.d + self.orders().min_length()
    }
}

impl ForecastModel for Sarima {
    fn kind(&self) -> ModelKind {
        ModelKind::Sarima
    }

    fn name(&self) -> String {
        format!(
            "SARIMA({},{},{})({},{},{},{})",
            self.p, self.d, self.q, self.big_p, self.big_d, self.big_q, self.s
        )
    }

    fn validate(&self) -> Result<()> {
        if self.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                self.s
            )));
        }
        Ok(())
    }

    fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast> {
        self.validate()?;
        let values = fitting_values(self.kind(), train, self.min_length())?;
        let values = forecast_differenced(self.kind(), &values, &self.lags(), self.orders(), horizon)?;
        Forecast::after(self.kind(), train, values)
    }
}
