//! Exploratory analysis: IQR outliers and classical decomposition

use crate::error::{ForecastError, Result};
use crate::series::SeriesSlice;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ship_math::moving_averages::centered_moving_average;
use ship_math::stats::{mean, Quartiles};
use std::fmt;
use tracing::debug;

/// Default fence multiplier
pub const DEFAULT_OUTLIER_K: f64 = 1.5;

/// Months flagged as outliers and the fences used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// Flagged months in time order
    pub months: Vec<NaiveDate>,
    /// Lower fence, `Q1 - k * IQR`
    pub lower: f64,
    /// Upper fence, `Q3 + k * IQR`
    pub upper: f64,
}

/// Flag months whose value lies outside `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// Quartiles are taken over the recorded values only; months with no value
/// are never flagged.
pub fn detect_outliers(series: SeriesSlice<'_>, k: f64) -> Result<OutlierReport> {
    if !k.is_finite() || k < 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "Outlier multiplier must be finite and non-negative, got {}",
            k
        )));
    }

    let values = series.observed_values();
    if values.is_empty() {
        return Err(ForecastError::EmptySeriesError(
            "No recorded values to search for outliers".to_string(),
        ));
    }

    let quartiles = Quartiles::of(&values)?;
    let (lower, upper) = quartiles.fences(k);

    let months = series
        .observations()
        .iter()
        .filter(|o| o.value.map_or(false, |v| v < lower || v > upper))
        .map(|o| o.month)
        .collect::<Vec<_>>();

    debug!(lower, upper, flagged = months.len(), "iqr outlier scan");

    Ok(OutlierReport {
        months,
        lower,
        upper,
    })
}

/// How the components of a decomposition combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionKind {
    #[default]
    Additive,
    Multiplicative,
}

impl fmt::Display for DecompositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompositionKind::Additive => f.write_str("additive"),
            DecompositionKind::Multiplicative => f.write_str("multiplicative"),
        }
    }
}

/// Trend, seasonal and residual components of a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    /// Combination rule
    pub kind: DecompositionKind,
    /// Season length
    pub period: usize,
    /// Months in order
    pub months: Vec<NaiveDate>,
    /// Input values
    pub observed: Vec<f64>,
    /// Centred moving average; `None` at the ends
    pub trend: Vec<Option<f64>>,
    /// Seasonal index for each month
    pub seasonal: Vec<f64>,
    /// What is left once trend and season are removed
    pub residual: Vec<Option<f64>>,
}

impl Decomposition {
    /// One seasonal index per position in the cycle
    pub fn seasonal_indices(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }
}

/// Classical moving-average decomposition
pub fn decompose(
    series: SeriesSlice<'_>,
    kind: DecompositionKind,
    period: usize,
) -> Result<Decomposition> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "Decomposition period must be at least 2, got {}",
            period
        )));
    }
    if series.missing_count() > 0 {
        return Err(ForecastError::DataFormatError(format!(
            "Decomposition needs a complete series, {} months are missing",
            series.missing_count()
        )));
    }

    let observed = series.observed_values();
    if observed.len() < 2 * period {
        return Err(ForecastError::InsufficientDataError {
            subject: "decomposition".to_string(),
            needed: 2 * period,
            got: observed.len(),
        });
    }
    if kind == DecompositionKind::Multiplicative && observed.iter().any(|v| *v <= 0.0) {
        return Err(ForecastError::DataFormatError(
            "Multiplicative decomposition needs strictly positive values".to_string(),
        ));
    }

    let trend = centered_moving_average(&observed, period)?;

    let remove = |y: f64, t: f64| match kind {
        DecompositionKind::Additive => y - t,
        DecompositionKind::Multiplicative => y / t,
    };

    // Average the detrended values per cycle position
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (y, t)) in observed.iter().zip(&trend).enumerate() {
        if let Some(t) = t {
            sums[i % period] += remove(*y, *t);
            counts[i % period] += 1;
        }
    }
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, c)| if *c > 0 { s / *c as f64 } else { 0.0 })
        .collect();

    let mean = mean(&indices)?;
    match kind {
        DecompositionKind::Additive => indices.iter_mut().for_each(|s| *s -= mean),
        DecompositionKind::Multiplicative => indices.iter_mut().for_each(|s| *s /= mean),
    }

    let seasonal: Vec<f64> = (0..observed.len()).map(|i| indices[i % period]).collect();
    let residual = observed
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((y, t), s)| {
            t.map(|t| match kind {
                DecompositionKind::Additive => y - t - s,
                DecompositionKind::Multiplicative => y / (t * s),
            })
        })
        .collect();

    Ok(Decomposition {
        kind,
        period,
        months: series.months(),
        observed,
        trend,
        seasonal,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Observation, TimeSeries};
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_values(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn test_single_outlier_flagged() {
        let s = series(&[10.0, 11.0, 10.5, 9.5, 10.2, 95.0, 10.1, 9.9]);
        let report = detect_outliers(s.as_slice(), DEFAULT_OUTLIER_K).unwrap();

        assert_eq!(report.months, vec![NaiveDate::from_ymd_opt(2022, 6, 1).unwrap()]);
        assert!(report.lower < 9.5 && report.upper < 95.0);
    }

    #[test]
    fn test_outlier_parameter_checks() {
        let s = series(&[1.0, 2.0]);
        assert!(matches!(
            detect_outliers(s.as_slice(), -1.0),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            detect_outliers(s.as_slice(), f64::NAN),
            Err(ForecastError::InvalidParameter(_))
        ));

        let empty = TimeSeries::from_observations(vec![Observation::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            None,
        )])
        .unwrap();
        assert!(matches!(
            detect_outliers(empty.as_slice(), 1.5),
            Err(ForecastError::EmptySeriesError(_))
        ));
    }

    #[test]
    fn test_additive_decomposition_recovers_pattern() {
        let pattern = [3.0, -1.0, -2.0, 0.0];
        let values: Vec<f64> = (0..16).map(|t| 50.0 + t as f64 + pattern[t % 4]).collect();
        let d = decompose(series(&values).as_slice(), DecompositionKind::Additive, 4).unwrap();

        for (got, want) in d.seasonal_indices().iter().zip(pattern) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
        assert_eq!(d.trend[0], None);
        assert_relative_eq!(d.trend[2].unwrap(), 52.0, epsilon = 1e-9);
        assert_relative_eq!(d.residual[5].unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiplicative_indices_average_to_one() {
        let pattern = [1.2, 0.8, 1.1, 0.9];
        let values: Vec<f64> = (0..12).map(|t| 100.0 * pattern[t % 4]).collect();
        let d = decompose(series(&values).as_slice(), DecompositionKind::Multiplicative, 4).unwrap();

        let mean = d.seasonal_indices().iter().sum::<f64>() / 4.0;
        assert_relative_eq!(mean, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decomposition_needs_two_periods() {
        let values: Vec<f64> = (0..7).map(|t| t as f64 + 1.0).collect();
        assert!(matches!(
            decompose(series(&values).as_slice(), DecompositionKind::Additive, 4),
            Err(ForecastError::InsufficientDataError { needed: 8, got: 7, .. })
        ));
    }
}
