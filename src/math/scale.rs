//! Min-max scaling onto the fixed 1-10 radar axis.
//!
//! Ranges are computed over the full entity set with non-numeric cells
//! zero-filled: every entity has to land somewhere on every axis. This is the
//! opposite of the aggregator, which excludes such cells so they cannot bias a
//! mean.

use crate::domain::{KpiDefinition, KpiScale, NormalizedRecord, ScaleRange};
use crate::math::coerce_or_zero;

pub const SCALE_MIN: f64 = 1.0;
pub const SCALE_MAX: f64 = 10.0;
/// Returned for a constant column (`max == min`).
pub const SCALE_MIDPOINT: f64 = 5.0;

impl ScaleRange {
    /// Range of the given values; `None` when there are none.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut any = false;
        for v in values {
            min = min.min(v);
            max = max.max(v);
            any = true;
        }
        any.then_some(ScaleRange { min, max })
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Map a raw value onto `[1, 10]` relative to `range`.
///
/// The result is clamped to the axis. A constant column, or a span too wide
/// to represent, maps to the midpoint.
pub fn scale_value(value: f64, range: ScaleRange) -> f64 {
    let span = range.max - range.min;
    if range.is_degenerate() || !span.is_finite() {
        return SCALE_MIDPOINT;
    }
    let scaled = SCALE_MIN + (value - range.min) / span * (SCALE_MAX - SCALE_MIN);
    scaled.clamp(SCALE_MIN, SCALE_MAX)
}

/// Zero-filled value of a KPI for one record.
pub fn scaled_input(record: &NormalizedRecord, kpi: &KpiDefinition) -> f64 {
    kpi.source_field
        .as_deref()
        .and_then(|field| record.get(field))
        .map(coerce_or_zero)
        .unwrap_or(0.0)
}

/// Compute one scale range per column-backed KPI over every record.
///
/// The overview pseudo-KPI is skipped. Returns an empty list for an empty
/// record set.
pub fn compute_scales<'a, I>(records: &[NormalizedRecord], kpis: I) -> Vec<KpiScale>
where
    I: IntoIterator<Item = &'a KpiDefinition>,
{
    kpis.into_iter()
        .filter_map(|kpi| {
            let source_field = kpi.source_field.clone()?;
            let range = ScaleRange::from_values(records.iter().map(|r| scaled_input(r, kpi)))?;
            Some(KpiScale {
                kpi_id: kpi.id.clone(),
                title: kpi.title.clone(),
                source_field,
                range,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(entity: &str, x: &str) -> NormalizedRecord {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), entity.to_string());
        fields.insert("x".to_string(), x.to_string());
        NormalizedRecord {
            entity: entity.to_string(),
            fields,
        }
    }

    fn kpi_x() -> KpiDefinition {
        KpiDefinition {
            id: "x".to_string(),
            title: "X".to_string(),
            unit: "u".to_string(),
            tooltip: String::new(),
            source_field: Some("x".to_string()),
        }
    }

    #[test]
    fn constant_column_scales_to_midpoint() {
        let records = vec![record("A", "7"), record("B", "7"), record("C", "7")];
        let scales = compute_scales(&records, [&kpi_x()]);
        assert_eq!(scales.len(), 1);
        for r in &records {
            let v = scale_value(scaled_input(r, &kpi_x()), scales[0].range);
            assert_eq!(v, SCALE_MIDPOINT);
        }
    }

    #[test]
    fn endpoints_map_to_one_and_ten() {
        let range = ScaleRange { min: 10.0, max: 30.0 };
        assert!((scale_value(10.0, range) - 1.0).abs() < 1e-12);
        assert!((scale_value(30.0, range) - 10.0).abs() < 1e-12);
        assert!((scale_value(20.0, range) - 5.5).abs() < 1e-12);

        for i in 0..=100 {
            let v = 10.0 + 20.0 * (i as f64) / 100.0;
            let s = scale_value(v, range);
            assert!((SCALE_MIN..=SCALE_MAX).contains(&s), "{v} scaled to {s}");
        }
    }

    #[test]
    fn extreme_magnitudes_stay_on_the_axis() {
        let values = [-1e307, 1e307, 0.0];
        let range = ScaleRange::from_values(values).unwrap();
        let scaled: Vec<f64> = values.iter().map(|&v| scale_value(v, range)).collect();
        assert!((scaled[0] - 1.0).abs() < 1e-12);
        assert!((scaled[1] - 10.0).abs() < 1e-12);
        assert!((scaled[2] - 5.5).abs() < 1e-12);

        let unbounded = ScaleRange { min: -1e308, max: 1e308 };
        assert_eq!(scale_value(0.0, unbounded), SCALE_MIDPOINT);

        let range = ScaleRange { min: 0.0, max: 10.0 };
        assert_eq!(scale_value(-5.0, range), SCALE_MIN);
        assert_eq!(scale_value(50.0, range), SCALE_MAX);
    }

    #[test]
    fn non_numeric_cells_are_zero_filled() {
        let records = vec![record("A", "n/a"), record("B", "50"), record("C", "100")];
        let scales = compute_scales(&records, [&kpi_x()]);
        assert_eq!(scales[0].range, ScaleRange { min: 0.0, max: 100.0 });
        assert!((scale_value(scaled_input(&records[0], &kpi_x()), scales[0].range) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overview_and_empty_sets_produce_no_ranges() {
        let mut overview = kpi_x();
        overview.source_field = None;
        assert!(compute_scales(&[record("A", "1")], [&overview]).is_empty());
        assert!(compute_scales(&[], [&kpi_x()]).is_empty());
    }
}
