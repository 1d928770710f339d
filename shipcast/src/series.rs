//! Monthly time series types

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The month `n` months after `month`
pub fn add_months(month: NaiveDate, n: u32) -> Result<NaiveDate> {
    month
        .checked_add_months(Months::new(n))
        .ok_or_else(|| ForecastError::DataFormatError(format!("Month out of range: {} + {}", month, n)))
}

/// The `count` consecutive months following `last`
pub fn following_months(last: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    (1..=count as u32).map(|n| add_months(last, n)).collect()
}

/// Format a month the way reports show it (`2023-07`)
pub fn format_month(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

/// One month of the series. `value` is `None` for a month with no data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Month start
    pub month: NaiveDate,
    /// Shipped quantity, if recorded
    pub value: Option<f64>,
}

impl Observation {
    /// Create an observation, normalising the date to its month start
    pub fn new(month: NaiveDate, value: Option<f64>) -> Self {
        Self {
            month: month_start(month),
            value,
        }
    }
}

/// Strictly ordered, gap-free monthly series
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    points: Vec<Observation>,
}

impl TimeSeries {
    /// Build from observations that are already consecutive months.
    ///
    /// Use [`crate::data::SeriesStore`] to normalise raw, unordered input.
    pub fn from_observations(points: Vec<Observation>) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::EmptySeriesError(
                "A time series needs at least one month".to_string(),
            ));
        }
        for pair in points.windows(2) {
            let expected = add_months(pair[0].month, 1)?;
            if pair[1].month != expected {
                return Err(ForecastError::DataFormatError(format!(
                    "Months must be consecutive: {} is followed by {}",
                    format_month(pair[0].month),
                    format_month(pair[1].month)
                )));
            }
        }

        Ok(Self { points })
    }

    /// Build a fully observed series starting at `first`
    pub fn from_values(first: NaiveDate, values: &[f64]) -> Result<Self> {
        let first = month_start(first);
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| Ok(Observation::new(add_months(first, i as u32)?, Some(*v))))
            .collect::<Result<Vec<_>>>()?;
        Self::from_observations(points)
    }

    /// Borrow the whole series
    pub fn as_slice(&self) -> SeriesSlice<'_> {
        SeriesSlice {
            points: &self.points,
        }
    }

    /// The observations
    pub fn observations(&self) -> &[Observation] {
        &self.points
    }

    /// Number of months
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Read-only view over a contiguous run of a [`TimeSeries`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSlice<'a> {
    points: &'a [Observation],
}

impl<'a> SeriesSlice<'a> {
    /// The observations
    pub fn observations(&self) -> &'a [Observation] {
        self.points
    }

    /// Number of months
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the view holds no months
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First month, if any
    pub fn first_month(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.month)
    }

    /// Last month, if any
    pub fn last_month(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.month)
    }

    /// Months in order
    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    /// Values with gaps as `None`
    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Recorded values only, in order
    pub fn observed_values(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value).collect()
    }

    /// Number of months with no value
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_none()).count()
    }

    /// Sub-view `[start, end)`
    pub fn slice(&self, start: usize, end: usize) -> SeriesSlice<'a> {
        SeriesSlice {
            points: &self.points[start..end],
        }
    }

    /// Values with gaps repaired for model fitting.
    ///
    /// Leading gaps are dropped, interior gaps are linearly interpolated and
    /// trailing gaps repeat the last recorded value.
    pub fn filled_values(&self) -> Vec<f64> {
        let first = match self.points.iter().position(|p| p.value.is_some()) {
            Some(i) => i,
            None => return Vec::new(),
        };

        let raw = &self.points[first..];
        let mut out = Vec::with_capacity(raw.len());
        let mut last_seen: Option<(usize, f64)> = None;

        for (i, point) in raw.iter().enumerate() {
            match point.value {
                Some(v) => {
                    if let Some((j, prev)) = last_seen {
                        // Fill the gap (j, i) on the straight line between the ends
                        let span = (i - j) as f64;
                        for k in (j + 1)..i {
                            out[k] = prev + (v - prev) * (k - j) as f64 / span;
                        }
                    }
                    out.push(v);
                    last_seen = Some((i, v));
                }
                None => {
                    // Provisional carry-forward, replaced if a later value appears
                    out.push(last_seen.map(|(_, prev)| prev).unwrap_or(0.0));
                }
            }
        }

        out
    }

    /// Copy into an owned series
    pub fn to_series(&self) -> Result<TimeSeries> {
        TimeSeries::from_observations(self.points.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(month_start(ymd(2023, 5, 17)), ymd(2023, 5, 1));
        assert_eq!(add_months(ymd(2023, 11, 1), 3).unwrap(), ymd(2024, 2, 1));
        assert_eq!(
            following_months(ymd(2023, 12, 1), 2).unwrap(),
            vec![ymd(2024, 1, 1), ymd(2024, 2, 1)]
        );
        assert_eq!(format_month(ymd(2023, 7, 1)), "2023-07");
    }

    #[test]
    fn test_rejects_non_consecutive_months() {
        let points = vec![
            Observation::new(ymd(2023, 1, 1), Some(1.0)),
            Observation::new(ymd(2023, 3, 1), Some(2.0)),
        ];
        assert!(matches!(
            TimeSeries::from_observations(points),
            Err(ForecastError::DataFormatError(_))
        ));
    }

    #[test]
    fn test_filled_values() {
        let points = vec![
            Observation::new(ymd(2023, 1, 1), None),
            Observation::new(ymd(2023, 2, 1), Some(10.0)),
            Observation::new(ymd(2023, 3, 1), None),
            Observation::new(ymd(2023, 4, 1), None),
            Observation::new(ymd(2023, 5, 1), Some(40.0)),
            Observation::new(ymd(2023, 6, 1), None),
        ];
        let series = TimeSeries::from_observations(points).unwrap();

        assert_eq!(series.as_slice().missing_count(), 3);
        assert_eq!(
            series.as_slice().filled_values(),
            vec![10.0, 20.0, 30.0, 40.0, 40.0]
        );
    }

    #[test]
    fn test_slice_views() {
        let series = TimeSeries::from_values(ymd(2023, 1, 15), &[1.0, 2.0, 3.0]).unwrap();
        let view = series.as_slice().slice(1, 3);
        assert_eq!(view.len(), 2);
        assert_eq!(view.first_month(), Some(ymd(2023, 2, 1)));
        assert_eq!(view.observed_values(), vec![2.0, 3.0]);
    }
}
