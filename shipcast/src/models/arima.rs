//! ARIMA models fitted by conditional sum of squares
//!
//! The ARMA part is estimated on the differenced series by minimising the
//! conditional sum of squared one-step errors with a bounded Nelder-Mead
//! search. [`ArmaOrders`] describes a (possibly seasonal) lag structure so
//! that [`crate::models::Sarima`] reuses the same estimation and forecasting.

use crate::error::{ForecastError, Result};
use crate::models::{fitting_values, Forecast, ForecastModel, ModelKind};
use crate::series::SeriesSlice;
use serde::{Deserialize, Serialize};
use ship_math::differencing::DifferencingChain;
use ship_math::optimization::{nelder_mead, NelderMeadConfig};
use ship_math::stats::mean;
use tracing::debug;

/// Coefficient bound that keeps AR and MA terms inside the unit circle
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA(p, d, q)
///
/// Any non-negative orders are accepted here. The dashboard ranges
/// (p, q up to 5 and d up to 2) are enforced by
/// [`crate::config::validate_model`]. High orders on a short series can leave
/// the optimiser unconverged, which surfaces as [`ForecastError::FitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arima {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving average order
    pub q: usize,
}

impl Default for Arima {
    fn default() -> Self {
        Self { p: 1, d: 1, q: 1 }
    }
}

impl Arima {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        let model = Self { p, d, q };
        model.validate()?;
        Ok(model)
    }

    /// ARMA lag structure on the differenced scale.
    ///
    /// A constant is estimated only when the series is not differenced.
    pub(crate) fn orders(&self) -> ArmaOrders {
        ArmaOrders {
            p: self.p,
            q: self.q,
            seasonal_p: 0,
            seasonal_q: 0,
            period: 1,
            constant: self.d == 0,
        }
    }

    /// Smallest training length the fit accepts
    pub fn min_length(&self) -> usize {
        self.d + self.orders().min_length()
    }
}

impl ForecastModel for Arima {
    fn kind(&self) -> ModelKind {
        ModelKind::Arima
    }

    fn name(&self) -> String {
        format!("ARIMA({},{},{})", self.p, self.d, self.q)
    }

    /// Orders are unbounded at this level; see the type docs
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn forecast(&self, train: SeriesSlice<'_>, horizon: usize) -> Result<Forecast> {
        self.validate()?;
        let values = fitting_values(self.kind(), train, self.min_length())?;
        let lags = vec![1; self.d];
        let values = forecast_differenced(self.kind(), &values, &lags, self.orders(), horizon)?;
        Forecast::after(self.kind(), train, values)
    }
}

/// Lag structure of a multiplicative seasonal ARMA model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArmaOrders {
    pub p: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_q: usize,
    pub period: usize,
    pub constant: bool,
}

impl ArmaOrders {
    /// Number of free parameters
    pub fn n_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q + usize::from(self.constant)
    }

    /// Largest AR lag after expansion
    pub fn ar_span(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    /// Largest MA lag after expansion
    pub fn ma_span(&self) -> usize {
        self.q + self.seasonal_q * self.period
    }

    /// Observations needed on the differenced scale: the AR warm-up plus one
    /// residual per parameter plus one
    pub fn min_length(&self) -> usize {
        self.ar_span() + self.n_params() + 1
    }

    /// Split a parameter vector and expand the lag polynomials.
    ///
    /// Parameter layout is `[φ.., Φ.., θ.., Θ.., μ?]`. The returned vectors are
    /// indexed by lag (index 0 unused) so that
    /// `w_t - μ = Σ ar[k] (w_{t-k} - μ) + e_t + Σ ma[k] e_{t-k}`.
    pub fn expand(&self, params: &[f64]) -> ArmaCoefficients {
        let (phi, rest) = params.split_at(self.p);
        let (seasonal_phi, rest) = rest.split_at(self.seasonal_p);
        let (theta, rest) = rest.split_at(self.q);
        let (seasonal_theta, rest) = rest.split_at(self.seasonal_q);
        let mean = if self.constant {
            rest.first().copied().unwrap_or(0.0)
        } else {
            0.0
        };

        let s = self.period;

        // (1 - Σφ_i L^i)(1 - ΣΦ_j L^{js}): the cross terms enter with a minus
        let mut ar = vec![0.0; self.ar_span() + 1];
        for (i, coef) in phi.iter().enumerate() {
            ar[i + 1] += coef;
        }
        for (j, seasonal) in seasonal_phi.iter().enumerate() {
            let lag = (j + 1) * s;
            ar[lag] += seasonal;
            for (i, coef) in phi.iter().enumerate() {
                ar[lag + i + 1] -= coef * seasonal;
            }
        }

        // (1 + Σθ_i L^i)(1 + ΣΘ_j L^{js})
        let mut ma = vec![0.0; self.ma_span() + 1];
        for (i, coef) in theta.iter().enumerate() {
            ma[i + 1] += coef;
        }
        for (j, seasonal) in seasonal_theta.iter().enumerate() {
            let lag = (j + 1) * s;
            ma[lag] += seasonal;
            for (i, coef) in theta.iter().enumerate() {
                ma[lag + i + 1] += coef * seasonal;
            }
        }

        ArmaCoefficients { ar, ma, mean }
    }

    /// Starting point and bounds for the search
    fn initial_guess(&self, mean: f64) -> (Vec<f64>, Vec<(f64, f64)>) {
        let mut initial = Vec::with_capacity(self.n_params());
        for i in 0..self.p {
            initial.push(0.1 / (i + 1) as f64);
        }
        for j in 0..self.seasonal_p {
            initial.push(0.1 / (j + 1) as f64);
        }
        for i in 0..self.q {
            initial.push(0.1 / (i + 1) as f64);
        }
        for j in 0..self.seasonal_q {
            initial.push(0.1 / (j + 1) as f64);
        }

        let mut bounds = vec![(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); initial.len()];
        if self.constant {
            initial.push(mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }

        (initial, bounds)
    }
}

/// Expanded ARMA coefficients
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArmaCoefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub mean: f64,
}

impl ArmaCoefficients {
    /// One-step residuals, conditional on zero shocks before the AR warm-up
    pub fn residuals(&self, w: &[f64]) -> Vec<f64> {
        let start = self.ar.len() - 1;
        let mut residuals = vec![0.0; w.len()];

        for t in start..w.len() {
            let error = w[t] - self.predict(w, &residuals, t);
            residuals[t] = error;
        }

        residuals
    }

    /// Conditional sum of squares
    pub fn css(&self, w: &[f64]) -> f64 {
        let start = self.ar.len() - 1;
        self.residuals(w)[start..].iter().map(|e| e * e).sum()
    }

    /// Extend `w` by `horizon` steps with future shocks set to zero
    pub fn forecast(&self, w: &[f64], horizon: usize) -> Vec<f64> {
        let mut extended = w.to_vec();
        let mut shocks = self.residuals(w);

        for _ in 0..horizon {
            let t = extended.len();
            let next = self.predict(&extended, &shocks, t);
            extended.push(next);
            shocks.push(0.0);
        }

        extended[w.len()..].to_vec()
    }

    fn predict(&self, w: &[f64], shocks: &[f64], t: usize) -> f64 {
        let mut pred = self.mean;
        for (lag, coef) in self.ar.iter().enumerate().skip(1) {
            pred += coef * (w[t - lag] - self.mean);
        }
        for (lag, coef) in self.ma.iter().enumerate().skip(1) {
            if lag <= t {
                pred += coef * shocks[t - lag];
            }
        }
        pred
    }
}

/// Estimate an ARMA model on `w` by conditional sum of squares
pub(crate) fn fit_arma(model: ModelKind, w: &[f64], orders: ArmaOrders) -> Result<ArmaCoefficients> {
    if w.len() < orders.min_length() {
        return Err(ForecastError::insufficient(model, orders.min_length(), w.len()));
    }

    let mean = mean(w)?;
    let (initial, bounds) = orders.initial_guess(mean);

    let config = NelderMeadConfig {
        max_iter: 5000,
        tolerance: 1e-8,
        ..Default::default()
    };
    let result = nelder_mead(
        |params| orders.expand(params).css(w),
        &initial,
        Some(&bounds),
        config,
    );

    debug!(
        %model,
        params = ?result.optimal_point,
        css = result.optimal_value,
        iterations = result.iterations,
        "conditional sum of squares fit"
    );

    if !result.optimal_value.is_finite() {
        return Err(ForecastError::fit(model, "objective is not finite"));
    }
    if !result.converged {
        return Err(ForecastError::fit(
            model,
            format!("optimiser did not converge in {} iterations", result.iterations),
        ));
    }

    Ok(orders.expand(&result.optimal_point))
}

/// Difference with `lags`, fit the ARMA part and integrate its forecast
pub(crate) fn forecast_differenced(
    model: ModelKind,
    values: &[f64],
    lags: &[usize],
    orders: ArmaOrders,
    horizon: usize,
) -> Result<Vec<f64>> {
    let needed = DifferencingChain::loss(lags) + orders.min_length();
    if values.len() < needed {
        return Err(ForecastError::insufficient(model, needed, values.len()));
    }

    let chain = DifferencingChain::apply(values, lags)?;
    let coefficients = fit_arma(model, chain.differenced(), orders)?;
    let differenced_forecast = coefficients.forecast(chain.differenced(), horizon);

    Ok(chain.integrate(&differenced_forecast))
}
