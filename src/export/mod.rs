//! Presentation of power curves
//!
//! The aggregate is rendered as a mapping from the string form of each
//! duration to a watt value rounded to one decimal. Absent durations are
//! omitted and an empty mapping means "no qualifying data".

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::AggregatePowerCurve;

pub mod csv;
pub mod json;
pub mod text;

/// Output formats for a power curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Table,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "table" | "text" | "txt" => Ok(ExportFormat::Table),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

impl From<::csv::Error> for ExportError {
    fn from(err: ::csv::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

/// One rendered point of a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub duration_seconds: u32,
    pub watts: f64,
}

/// Round to one decimal place, halves away from zero
pub fn round_watts(watts: f64) -> f64 {
    (watts * 10.0).round() / 10.0
}

/// Rounded points in ascending duration order
pub fn curve_points(curve: &AggregatePowerCurve) -> Vec<CurvePoint> {
    curve
        .iter()
        .map(|(duration_seconds, watts)| CurvePoint {
            duration_seconds,
            watts: round_watts(watts),
        })
        .collect()
}

/// Human-friendly duration label: `45s`, `5m`, `1h30m`
pub fn format_duration(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    let mut label = String::new();
    if h > 0 {
        label.push_str(&format!("{}h", h));
    }
    if m > 0 {
        label.push_str(&format!("{}m", m));
    }
    if s > 0 || label.is_empty() {
        label.push_str(&format!("{}s", s));
    }
    label
}

/// Render a curve in the given format
pub fn render(curve: &AggregatePowerCurve, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => json::render_curve(curve),
        ExportFormat::Csv => csv::render_curve(curve),
        ExportFormat::Table => Ok(text::render_table(curve)),
    }
}

/// Render a curve and write it to `output_path`
pub fn export_curve<P: AsRef<Path>>(
    curve: &AggregatePowerCurve,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    let rendered = render(curve, format)?;
    std::fs::write(output_path, rendered)?;
    Ok(())
}
