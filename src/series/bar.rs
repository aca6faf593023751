//! Bar-with-average-line series.
//!
//! The selection only filters which bars are drawn. The baseline is always a
//! full-population mean, so the average line stays put while the user narrows
//! the comparison set.

use tracing::debug;

use crate::domain::{
    BaselinePolicy, ChartSeries, ColorClass, KpiDefinition, NormalizedRecord, RecordSet, Selection,
};
use crate::kpi::KpiRegistry;
use crate::math::scaled_input;
use crate::report::aggregate_kpi;

/// Full-population baseline of one KPI.
///
/// Falls back to `0.0` when the policy's mean is undefined (no records, or no
/// numeric observation under `Observed`).
pub fn baseline_value(records: &[NormalizedRecord], kpi: &KpiDefinition, policy: BaselinePolicy) -> f64 {
    match policy {
        BaselinePolicy::Observed => aggregate_kpi(records, kpi).mean.unwrap_or(0.0),
        BaselinePolicy::Population => {
            if records.is_empty() {
                return 0.0;
            }
            let total: f64 = records.iter().map(|r| scaled_input(r, kpi)).sum();
            total / records.len() as f64
        }
    }
}

/// Build the bar series of one KPI for the current selection.
///
/// Bars keep data order (not selection order); non-numeric cells plot as `0`.
pub fn build_bar_series(
    records: &RecordSet,
    kpi: &KpiDefinition,
    selection: &Selection,
    policy: BaselinePolicy,
) -> ChartSeries {
    let baseline_value = baseline_value(&records.records, kpi, policy);

    let shown: Vec<&NormalizedRecord> = records
        .records
        .iter()
        .filter(|r| selection.includes(&r.entity))
        .collect();

    let labels: Vec<String> = shown.iter().map(|r| r.entity.clone()).collect();
    let values: Vec<f64> = shown.iter().map(|r| scaled_input(r, kpi)).collect();
    let color_classes = values
        .iter()
        .map(|v| ColorClass::classify(*v, baseline_value))
        .collect();

    ChartSeries {
        kpi_id: kpi.id.clone(),
        title: kpi.title.clone(),
        unit: kpi.unit.clone(),
        baseline: vec![baseline_value; labels.len()],
        labels,
        values,
        baseline_value,
        color_classes,
    }
}

/// Bar series for every column-backed KPI, in registry order.
pub fn build_all_bar_series(
    records: &RecordSet,
    registry: &KpiRegistry,
    selection: &Selection,
    policy: BaselinePolicy,
) -> Vec<ChartSeries> {
    let series: Vec<ChartSeries> = registry
        .chart_kpis()
        .map(|kpi| build_bar_series(records, kpi, selection, policy))
        .collect();
    debug!(
        charts = series.len(),
        shown = series.first().map(|s| s.labels.len()).unwrap_or(0),
        "built bar series"
    );
    series
}

/// Selected names that match no entity in the record set.
pub fn unknown_selections<'a>(records: &RecordSet, selection: &'a Selection) -> Vec<&'a str> {
    selection
        .names()
        .iter()
        .filter(|name| records.find(name).is_none())
        .map(String::as_str)
        .collect()
}
