//! One dashboard session per refresh.
//!
//! The session owns the snapshot and everything derived from it that does not
//! depend on the selection (summary, scale ranges). Selection-dependent series
//! are computed on demand. A refresh builds a new session; nothing is mutated.

use std::sync::Arc;

use tracing::warn;

use crate::app::pipeline::Snapshot;
use crate::domain::{
    BaselinePolicy, ChartSeries, DashboardSummary, KpiScale, RadarSeries, RecordSet, Selection,
};
use crate::kpi::KpiRegistry;
use crate::math::compute_scales;
use crate::report::summarize;
use crate::series::{build_all_bar_series, radar_for, unknown_selections};

#[derive(Debug, Clone)]
pub struct DashboardSession {
    snapshot: Snapshot,
    registry: Arc<KpiRegistry>,
    baseline_policy: BaselinePolicy,
    summary: DashboardSummary,
    scales: Vec<KpiScale>,
}

impl DashboardSession {
    pub fn new(snapshot: Snapshot, registry: Arc<KpiRegistry>, baseline_policy: BaselinePolicy) -> Self {
        let summary = summarize(&snapshot.records, &registry);
        let scales = compute_scales(&snapshot.records.records, registry.chart_kpis());
        Self {
            snapshot,
            registry,
            baseline_policy,
            summary,
            scales,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn records(&self) -> &RecordSet {
        &self.snapshot.records
    }

    pub fn summary(&self) -> &DashboardSummary {
        &self.summary
    }

    /// Full-population scale ranges (never filtered by the selection).
    pub fn scales(&self) -> &[KpiScale] {
        &self.scales
    }

    /// Entity names for a selector widget, in data order.
    pub fn entities(&self) -> Vec<&str> {
        self.records().entities().collect()
    }

    /// Bar series for every KPI under the given selection.
    pub fn bar_series(&self, selection: &Selection) -> Vec<ChartSeries> {
        for name in unknown_selections(self.records(), selection) {
            warn!(entity = name, "selected organization not found in data");
        }
        build_all_bar_series(self.records(), &self.registry, selection, self.baseline_policy)
    }

    pub fn radar(&self, entity: &str) -> Option<RadarSeries> {
        radar_for(self.records(), &self.scales, entity)
    }

    /// The radar shown before the user picks anyone: the first entity.
    pub fn default_radar_entity(&self) -> Option<&str> {
        self.records().records.first().map(|r| r.entity.as_str())
    }
}
