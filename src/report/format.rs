//! Formatted terminal output: summary cards, bar tables, radar profiles.
//!
//! We keep formatting code in one place so the pipeline stages stay pure and
//! output changes are localized.

use num_format::{Locale, ToFormattedString};

use crate::domain::{CardAggregation, CardValue, ChartSeries, DashboardSummary, RadarSeries};
use crate::io::normalize::SchemaReport;

/// Rendered in place of a value that does not exist (never `0`).
pub const PLACEHOLDER: &str = "--";

/// Format a card value: means with one decimal, totals with thousands separators.
pub fn format_card_value(card: &CardValue) -> String {
    let Some(v) = card.value else {
        return PLACEHOLDER.to_string();
    };

    let body = match card.aggregation {
        CardAggregation::EntityCount => format!("{}", v as u64),
        CardAggregation::Mean { .. } => format!("{v:.1}"),
        CardAggregation::Total { .. } | CardAggregation::CompoundTotal { .. } => format_thousands(v),
    };

    match &card.value_prefix {
        Some(prefix) => format!("{prefix}{body}"),
        None => body,
    }
}

/// `1234567.5` -> `1,234,567.50`; whole numbers drop the fraction.
pub fn format_thousands(v: f64) -> String {
    let sign = if v < 0.0 { "-" } else { "" };
    let cents = (v.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc() as u64;
    let grouped = whole.to_formatted_string(&Locale::en);
    if v.fract() == 0.0 {
        format!("{sign}{grouped}")
    } else {
        let fraction = (cents % 100.0) as u8;
        format!("{sign}{grouped}.{fraction:02}")
    }
}

/// Summary cards block.
pub fn format_summary(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    out.push_str("=== KPI Summary ===\n");

    let title_width = summary
        .cards
        .iter()
        .map(|c| c.title.chars().count())
        .max()
        .unwrap_or(0);

    for card in &summary.cards {
        out.push_str(&format!(
            "{:<title_width$}  {:>14}  {}\n",
            card.title,
            format_card_value(card),
            card.unit,
        ));
    }
    out
}

/// One bar table: `label  bars|  value  class`.
///
/// Bars are scaled to the larger of the largest value and the baseline; the
/// `|` column marks the baseline.
pub fn format_bar_series(series: &ChartSeries, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "--- {} ({}) | average {:.2} ---\n",
        series.title, series.unit, series.baseline_value
    ));

    if series.labels.is_empty() {
        out.push_str("(no organizations selected)\n");
        return out;
    }

    let width = width.max(1);
    let max = series
        .values
        .iter()
        .copied()
        .chain(std::iter::once(series.baseline_value))
        .fold(0.0_f64, f64::max);
    let cells = |v: f64| -> usize {
        if max <= 0.0 || v <= 0.0 {
            0
        } else {
            ((v / max) * width as f64).round() as usize
        }
    };
    let marker = cells(series.baseline_value).min(width);

    let label_width = series
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);

    for ((label, value), class) in series
        .labels
        .iter()
        .zip(&series.values)
        .zip(&series.color_classes)
    {
        let filled = cells(*value).min(width);
        let bar: String = (0..=width)
            .map(|i| {
                if i == marker {
                    '|'
                } else if i < filled {
                    '#'
                } else {
                    ' '
                }
            })
            .collect();
        out.push_str(&format!(
            "{label:<label_width$}  {bar}  {value:>12.2}  {}\n",
            class.as_str()
        ));
    }
    out
}

/// Radar profile as `title: value` lines on the 1-10 scale.
pub fn format_radar(radar: &RadarSeries) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- Organization Radar: {} (1-10) ---\n", radar.entity));
    let label_width = radar
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    for (label, value) in radar.labels.iter().zip(&radar.values) {
        out.push_str(&format!("{label:<label_width$}  {value:>5.2}\n"));
    }
    out
}

/// Schema warnings, or `None` when the sheet has every column.
pub fn format_schema_report(report: &SchemaReport, entity_field: &str) -> Option<String> {
    if report.is_complete() {
        return None;
    }
    let mut out = String::from("Schema warnings:\n");
    if !report.entity_field_present {
        out.push_str(&format!("- missing entity column `{entity_field}`\n"));
    }
    for field in &report.missing_fields {
        out.push_str(&format!("- missing KPI column `{field}`\n"));
    }
    Some(out)
}
