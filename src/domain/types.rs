//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the synchronous pipeline stages
//! - exported to JSON for rendering collaborators
//! - printed as a terminal report

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::DataSource;

/// Default entity identifier column of the published sheet.
pub const DEFAULT_ENTITY_FIELD: &str = "Organization Name";

/// What to do when two rows share the same entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the first row for an identifier, drop later ones (logged).
    #[default]
    KeepFirst,
    /// Keep every row, duplicates included.
    KeepAll,
}

/// Which population mean the bar-chart baseline uses.
///
/// Both variants are computed over the full (unfiltered) population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePolicy {
    /// Mean over numeric observations only (the Aggregator mean).
    #[default]
    Observed,
    /// Mean over every entity, non-numeric cells counted as zero.
    Population,
}

/// One normalized CSV row.
///
/// Values stay as trimmed strings; numeric coercion happens at read time so a
/// malformed cell never rejects the whole row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub entity: String,
    pub fields: BTreeMap<String, String>,
}

impl NormalizedRecord {
    /// Value of a known field. Unknown fields are `None`, blank cells are `Some("")`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// The normalized record set of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSet {
    pub entity_field: String,
    /// Header names in source order (overflow columns excluded).
    pub headers: Vec<String>,
    /// Records in source order.
    pub records: Vec<NormalizedRecord>,
}

impl RecordSet {
    pub fn empty(entity_field: impl Into<String>) -> Self {
        Self {
            entity_field: entity_field.into(),
            headers: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.headers.iter().any(|h| h == field)
    }

    /// Entity names in data order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.entity.as_str())
    }

    /// First record whose entity identifier matches exactly.
    pub fn find(&self, entity: &str) -> Option<&NormalizedRecord> {
        self.records.iter().find(|r| r.entity == entity)
    }
}

/// A registry entry: presentation metadata plus the column it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub tooltip: String,
    /// `None` for the overview (radar) pseudo-KPI.
    #[serde(default)]
    pub source_field: Option<String>,
}

impl KpiDefinition {
    pub fn is_overview(&self) -> bool {
        self.source_field.is_none()
    }
}

/// How a summary card derives its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardAggregation {
    /// Number of entities in the record set.
    EntityCount,
    /// Count-gated mean of one KPI.
    Mean { kpi: String },
    /// Sum of one KPI.
    Total { kpi: String },
    /// Sum across several KPIs (no mean).
    CompoundTotal { kpis: Vec<String> },
}

/// A dashboard summary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCard {
    pub id: String,
    pub title: String,
    pub aggregation: CardAggregation,
    /// Printed in front of the value (e.g. `$ `).
    #[serde(default)]
    pub value_prefix: Option<String>,
}

/// Per-KPI aggregate over numeric observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub tooltip: String,
    pub observed_count: usize,
    pub sum: f64,
    /// `None` when there is no numeric observation.
    pub mean: Option<f64>,
}

/// A resolved summary card value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardValue {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub tooltip: String,
    pub aggregation: CardAggregation,
    pub observed_count: usize,
    /// `None` renders as the placeholder, never as zero.
    pub value: Option<f64>,
    pub value_prefix: Option<String>,
}

/// Everything the summary cards need for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_orgs: usize,
    pub kpis: Vec<KpiSummary>,
    pub cards: Vec<CardValue>,
}

/// Min/max of one KPI over all entities (zero-filled).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

/// Scale range tagged with the KPI it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiScale {
    pub kpi_id: String,
    pub title: String,
    pub source_field: String,
    pub range: ScaleRange,
}

/// Bar color class relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    Above,
    Below,
}

impl ColorClass {
    pub fn classify(value: f64, baseline: f64) -> Self {
        if value >= baseline {
            ColorClass::Above
        } else {
            ColorClass::Below
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorClass::Above => "above",
            ColorClass::Below => "below",
        }
    }
}

/// Bar-with-average-line series for one KPI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub kpi_id: String,
    pub title: String,
    pub unit: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub baseline_value: f64,
    /// The baseline broadcast to `labels.len()`.
    pub baseline: Vec<f64>,
    pub color_classes: Vec<ColorClass>,
}

/// Radar (spider) series for one entity, values on the 1-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSeries {
    pub entity: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// The active entity selection. Empty means "show all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: Vec<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.names.is_empty()
    }

    pub fn includes(&self, entity: &str) -> bool {
        self.is_all() || self.names.iter().any(|n| n == entity)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, `.env` and defaults.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Where the published CSV comes from.
    pub source: DataSource,
    pub entity_field: String,
    pub registry_path: Option<PathBuf>,
    pub selection: Selection,
    /// Entities to draw radar series for; empty means the first entity.
    pub radar_entities: Vec<String>,
    pub duplicate_policy: DuplicatePolicy,
    pub baseline_policy: BaselinePolicy,
    /// Extended normalization (overflow columns filtered by prefix).
    pub extended: bool,
    pub export_path: Option<PathBuf>,
    /// Bar width (columns) in the terminal report.
    pub bar_width: usize,
}
