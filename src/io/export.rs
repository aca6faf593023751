//! Export the dashboard payload to JSON.
//!
//! The export is what a rendering layer consumes: summary cards, one bar
//! series per KPI for the current selection, and radar profiles.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ChartSeries, DashboardSummary, RadarSeries};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardExport<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub source: &'a str,
    pub loaded_at: DateTime<Utc>,
    /// Selected entity names; empty means everyone is shown.
    pub selection: &'a [String],
    pub summary: &'a DashboardSummary,
    pub charts: &'a [ChartSeries],
    pub radar: &'a [RadarSeries],
}

/// Write the dashboard payload as pretty-printed JSON.
pub fn write_dashboard_json(path: &Path, export: &DashboardExport<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create export JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, export)
        .map_err(|e| AppError::config(format!("Failed to write export JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to flush export JSON: {e}")))
}
