//! Forecast tables as CSV and evaluation reports as JSON

use crate::error::Result;
use crate::metrics::EvaluationReport;
use crate::models::Forecast;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct ForecastRecord {
    date: String,
    forecast: f64,
}

/// Write the forecast as `date,forecast` rows
pub fn write_forecast_csv<W: Write>(forecast: &Forecast, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in forecast.points() {
        csv.serialize(ForecastRecord {
            date: point.month.format("%Y-%m-%d").to_string(),
            forecast: point.forecast,
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the forecast table to a CSV file
pub fn save_forecast_csv<P: AsRef<Path>>(forecast: &Forecast, path: P) -> Result<()> {
    let path = path.as_ref();
    write_forecast_csv(forecast, File::create(path)?)?;
    info!(path = %path.display(), rows = forecast.horizon(), "forecast written");
    Ok(())
}

/// Write an evaluation report as pretty-printed JSON
pub fn save_report_json<P: AsRef<Path>>(report: &EvaluationReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    info!(path = %path.display(), "evaluation report written");
    Ok(())
}
