//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - normalized records and the per-refresh record set (`RecordSet`)
//! - KPI registry entries and summary cards (`KpiDefinition`, `SummaryCard`)
//! - pipeline outputs (`DashboardSummary`, `ChartSeries`, `RadarSeries`)

pub mod types;

pub use types::*;
