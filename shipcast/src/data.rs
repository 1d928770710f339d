//! Loading shipment history into a normalised monthly series

use crate::error::{ForecastError, Result};
use crate::series::{add_months, format_month, month_start, Observation, TimeSeries};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{info, warn};

/// Name of the date column
pub const DATE_COLUMN: &str = "date";
/// Name of the quantity column
pub const QUANTITY_COLUMN: &str = "shipped_qty";

/// Loader for shipment history
#[derive(Debug)]
pub struct SeriesStore;

impl SeriesStore {
    /// Load a series from a CSV file with `date` and `shipped_qty` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        info!(path = %path.display(), rows = df.height(), "read shipment csv");
        Self::from_dataframe(&df)
    }

    /// Load a series from any CSV byte source
    pub fn from_reader<R: Read>(mut reader: R) -> Result<TimeSeries> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let df = CsvReader::new(Cursor::new(buf))
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Normalise an existing DataFrame
    pub fn from_dataframe(df: &DataFrame) -> Result<TimeSeries> {
        let dates = Self::date_column(df)?;
        let quantities = Self::quantity_column(df)?;

        if dates.is_empty() {
            return Err(ForecastError::EmptySeriesError(
                "Input contains no rows".to_string(),
            ));
        }

        Self::normalize(dates.into_iter().zip(quantities).collect())
    }

    /// Sort, reject duplicate months, and insert explicit gaps.
    ///
    /// Dates are truncated to their month start. Two rows in the same month
    /// are a [`ForecastError::DataFormatError`].
    pub fn normalize(rows: Vec<(NaiveDate, Option<f64>)>) -> Result<TimeSeries> {
        if rows.is_empty() {
            return Err(ForecastError::EmptySeriesError(
                "Input contains no rows".to_string(),
            ));
        }

        let mut by_month: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
        for (date, value) in rows {
            let month = month_start(date);
            if by_month.insert(month, value).is_some() {
                warn!(month = %format_month(month), "duplicate month in input");
                return Err(ForecastError::DataFormatError(format!(
                    "Duplicate entries for month {}",
                    format_month(month)
                )));
            }
        }

        // BTreeMap iterates in ascending order, so the bounds are the ends
        let (first, last) = match (by_month.keys().next(), by_month.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(ForecastError::EmptySeriesError(
                    "Input contains no rows".to_string(),
                ))
            }
        };

        let mut points = Vec::new();
        let mut month = first;
        while month <= last {
            let value = by_month.get(&month).copied().flatten();
            points.push(Observation::new(month, value));
            month = add_months(month, 1)?;
        }

        let gaps = points.len() - by_month.len();
        info!(
            months = points.len(),
            gaps,
            first = %format_month(first),
            last = %format_month(last),
            "normalised monthly series"
        );

        TimeSeries::from_observations(points)
    }

    fn date_column(df: &DataFrame) -> Result<Vec<NaiveDate>> {
        let col = df.column(DATE_COLUMN).map_err(|_| {
            ForecastError::DataFormatError(format!("Missing required column '{}'", DATE_COLUMN))
        })?;

        match col.dtype() {
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| match value {
                    Some(text) => parse_date(text).ok_or_else(|| {
                        ForecastError::DataFormatError(format!(
                            "Row {}: cannot parse date '{}'",
                            row + 1,
                            text
                        ))
                    }),
                    None => Err(ForecastError::DataFormatError(format!(
                        "Row {}: date is empty",
                        row + 1
                    ))),
                })
                .collect(),
            DataType::Date => {
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(|| {
                    ForecastError::DataFormatError("Invalid epoch".to_string())
                })?;
                col.date()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, days)| {
                        days.and_then(|d| epoch.checked_add_signed(chrono::Duration::days(d as i64)))
                            .ok_or_else(|| {
                                ForecastError::DataFormatError(format!(
                                    "Row {}: date is empty",
                                    row + 1
                                ))
                            })
                    })
                    .collect()
            }
            other => Err(ForecastError::DataFormatError(format!(
                "Column '{}' has type {} and cannot hold dates",
                DATE_COLUMN, other
            ))),
        }
    }

    fn quantity_column(df: &DataFrame) -> Result<Vec<Option<f64>>> {
        let col = df.column(QUANTITY_COLUMN).map_err(|_| {
            ForecastError::DataFormatError(format!(
                "Missing required column '{}'",
                QUANTITY_COLUMN
            ))
        })?;

        if !col.dtype().is_numeric() {
            // A column of only empty cells has no numeric type to infer
            if col.null_count() == col.len() {
                return Ok(vec![None; col.len()]);
            }
            return Err(ForecastError::DataFormatError(format!(
                "Column '{}' has type {}, expected numbers",
                QUANTITY_COLUMN,
                col.dtype()
            )));
        }

        let as_f64 = col.cast(&DataType::Float64)?;
        let values = as_f64.f64()?.into_iter().collect();
        Ok(values)
    }
}

/// Parse the date formats accepted in the `date` column
fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    // Year-month only
    NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2023-04-01"), Some(ymd(2023, 4, 1)));
        assert_eq!(parse_date("2023-04-15 00:00:00"), Some(ymd(2023, 4, 15)));
        assert_eq!(parse_date("2023-04-15T12:30:00"), Some(ymd(2023, 4, 15)));
        assert_eq!(parse_date("2023-04"), Some(ymd(2023, 4, 1)));
        assert_eq!(parse_date("April 2023"), None);
    }

    #[test]
    fn test_normalize_sorts_and_fills_gaps() {
        let rows = vec![
            (ymd(2023, 4, 1), Some(4.0)),
            (ymd(2023, 1, 1), Some(1.0)),
            (ymd(2023, 2, 1), None),
        ];
        let series = SeriesStore::normalize(rows).unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(
            series.as_slice().values(),
            vec![Some(1.0), None, None, Some(4.0)]
        );
        assert_eq!(series.as_slice().last_month(), Some(ymd(2023, 4, 1)));
    }

    #[test]
    fn test_normalize_rejects_duplicate_month() {
        let rows = vec![(ymd(2023, 1, 1), Some(1.0)), (ymd(2023, 1, 20), Some(2.0))];
        match SeriesStore::normalize(rows) {
            Err(ForecastError::DataFormatError(msg)) => assert!(msg.contains("2023-01")),
            other => panic!("expected duplicate rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_empty() {
        assert!(matches!(
            SeriesStore::normalize(Vec::new()),
            Err(ForecastError::EmptySeriesError(_))
        ));
    }

    #[test]
    fn test_from_dataframe() {
        let df = df!(
            "date" => &["2023-01-01", "2023-03-01"],
            "shipped_qty" => &[10i64, 30]
        )
        .unwrap();

        let series = SeriesStore::from_dataframe(&df).unwrap();
        assert_eq!(series.as_slice().values(), vec![Some(10.0), None, Some(30.0)]);
    }

    #[test]
    fn test_from_dataframe_missing_column() {
        let df = df!(
            "date" => &["2023-01-01"],
            "qty" => &[10.0]
        )
        .unwrap();

        match SeriesStore::from_dataframe(&df) {
            Err(ForecastError::DataFormatError(msg)) => assert!(msg.contains("shipped_qty")),
            other => panic!("expected missing column error, got {:?}", other),
        }
    }
}
