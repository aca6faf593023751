//! Radar (spider) series on the 1-10 scale.

use crate::domain::{KpiScale, NormalizedRecord, RadarSeries, RecordSet};
use crate::math::{coerce_or_zero, scale_value};

/// Scale one record against precomputed full-population ranges.
pub fn radar_series(record: &NormalizedRecord, scales: &[KpiScale]) -> RadarSeries {
    let values = scales
        .iter()
        .map(|s| {
            let raw = record.get(&s.source_field).map(coerce_or_zero).unwrap_or(0.0);
            scale_value(raw, s.range)
        })
        .collect();

    RadarSeries {
        entity: record.entity.clone(),
        labels: scales.iter().map(|s| s.title.clone()).collect(),
        values,
    }
}

/// Radar series of the first record matching `entity`, if any.
pub fn radar_for(records: &RecordSet, scales: &[KpiScale], entity: &str) -> Option<RadarSeries> {
    records.find(entity).map(|r| radar_series(r, scales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::normalize::{NormalizeOptions, normalize_csv};
    use crate::kpi::KpiRegistry;
    use crate::math::compute_scales;

    const SHEET: &str = "Organization Name,Membership Reach,Financial Health\n\
                         A,10,$100\n\
                         B,20,$100\n\
                         C,30,$100\n";

    #[test]
    fn radar_uses_registry_titles_and_scaled_values() {
        let registry = KpiRegistry::standard();
        let rs = normalize_csv(SHEET, &NormalizeOptions::default()).records;
        let scales = compute_scales(&rs.records, registry.chart_kpis());
        assert_eq!(scales.len(), 7);

        let radar = radar_for(&rs, &scales, "B").unwrap();
        assert_eq!(radar.labels.len(), 7);
        assert_eq!(radar.labels[0], "Membership Reach");
        assert!((radar.values[0] - 5.5).abs() < 1e-12);
        // Constant financial column and all-missing columns sit at the midpoint.
        assert_eq!(radar.values[2], 5.0);
        assert!(radar.values[1..].iter().all(|v| *v == 5.0));
    }

    #[test]
    fn scaling_ignores_the_selection() {
        let registry = KpiRegistry::standard();
        let rs = normalize_csv(SHEET, &NormalizeOptions::default()).records;
        let scales = compute_scales(&rs.records, registry.chart_kpis());

        let a = radar_for(&rs, &scales, "A").unwrap();
        let c = radar_for(&rs, &scales, "C").unwrap();
        assert_eq!(a.values[0], 1.0);
        assert_eq!(c.values[0], 10.0);
        assert!(radar_for(&rs, &scales, "Nobody").is_none());
    }
}
