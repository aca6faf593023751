//! Aggregation: per-KPI counts, sums and count-gated means.
//!
//! A cell contributes only when it coerces to a finite number. Blank or
//! malformed cells are excluded from both the sum and the observation count,
//! so they never drag a mean towards zero. With no observation the mean is
//! `None`, which renders as a placeholder rather than `0`.

use crate::domain::{
    CardAggregation, CardValue, DashboardSummary, KpiDefinition, KpiSummary, NormalizedRecord,
    RecordSet,
};
use crate::kpi::KpiRegistry;
use crate::math::coerce_numeric;

/// Observation count and sum over one or more columns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tally {
    pub count: usize,
    pub sum: f64,
}

impl Tally {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Tally every numeric cell of the given columns across all records.
pub fn tally_fields(records: &[NormalizedRecord], fields: &[&str]) -> Tally {
    let mut tally = Tally::default();
    for record in records {
        for field in fields {
            if let Some(v) = record.get(field).and_then(coerce_numeric) {
                tally.count += 1;
                tally.sum += v;
            }
        }
    }
    tally
}

/// Aggregate one KPI. The overview pseudo-KPI has no column and yields an
/// empty summary.
pub fn aggregate_kpi(records: &[NormalizedRecord], kpi: &KpiDefinition) -> KpiSummary {
    let tally = match kpi.source_field.as_deref() {
        Some(field) => tally_fields(records, &[field]),
        None => Tally::default(),
    };

    KpiSummary {
        id: kpi.id.clone(),
        title: kpi.title.clone(),
        unit: kpi.unit.clone(),
        tooltip: kpi.tooltip.clone(),
        observed_count: tally.count,
        sum: tally.sum,
        mean: tally.mean(),
    }
}

/// Compute the full dashboard summary for one record set.
pub fn summarize(records: &RecordSet, registry: &KpiRegistry) -> DashboardSummary {
    let kpis: Vec<KpiSummary> = registry
        .chart_kpis()
        .map(|kpi| aggregate_kpi(&records.records, kpi))
        .collect();

    let cards = registry
        .cards()
        .iter()
        .map(|card| {
            let (observed_count, value, unit) = match &card.aggregation {
                CardAggregation::EntityCount => {
                    (records.len(), Some(records.len() as f64), "Organizations".to_string())
                }
                CardAggregation::Mean { kpi } => {
                    let s = find_summary(&kpis, kpi);
                    (
                        s.map(|s| s.observed_count).unwrap_or(0),
                        s.and_then(|s| s.mean),
                        s.map(|s| s.unit.clone()).unwrap_or_default(),
                    )
                }
                CardAggregation::Total { kpi } => {
                    let s = find_summary(&kpis, kpi);
                    let count = s.map(|s| s.observed_count).unwrap_or(0);
                    (
                        count,
                        s.filter(|_| count > 0).map(|s| s.sum),
                        s.map(|s| s.unit.clone()).unwrap_or_default(),
                    )
                }
                CardAggregation::CompoundTotal { kpis: ids } => {
                    let fields: Vec<&str> = ids
                        .iter()
                        .filter_map(|id| registry.get(id))
                        .filter_map(|k| k.source_field.as_deref())
                        .collect();
                    let tally = tally_fields(&records.records, &fields);
                    let unit = ids
                        .first()
                        .and_then(|id| registry.get(id))
                        .map(|k| k.unit.clone())
                        .unwrap_or_default();
                    (tally.count, (tally.count > 0).then_some(tally.sum), unit)
                }
            };

            CardValue {
                id: card.id.clone(),
                title: card.title.clone(),
                unit,
                tooltip: registry.card_tooltip(card),
                aggregation: card.aggregation.clone(),
                observed_count,
                value,
                value_prefix: card.value_prefix.clone(),
            }
        })
        .collect();

    DashboardSummary {
        total_orgs: records.len(),
        kpis,
        cards,
    }
}

fn find_summary<'a>(kpis: &'a [KpiSummary], id: &str) -> Option<&'a KpiSummary> {
    kpis.iter().find(|s| s.id == id)
}
