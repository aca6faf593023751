//! CSV ingest and normalization.
//!
//! This module is responsible for turning a published spreadsheet CSV into a
//! `RecordSet` of trimmed, string-valued records keyed by header name.
//!
//! Design goals:
//! - **Never reject a row**: short rows are padded with empty strings, surplus
//!   fields are dropped, numeric coercion is deferred to read time
//! - **Explicit schema check**: missing entity/KPI columns are reported, not fatal
//! - **Deterministic behavior**: source order is preserved end to end
//!
//! Limitation: quote characters are not interpreted, so a quoted field that
//! contains a comma is split like any other field, and embedded newlines end
//! the record.

use std::collections::{BTreeMap, HashSet};

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{DEFAULT_ENTITY_FIELD, DuplicatePolicy, NormalizedRecord, RecordSet};
use crate::kpi::KpiRegistry;

/// Name prefix of auto-generated overflow columns (extended mode).
pub const OVERFLOW_PREFIX: &str = "__parsed_extra";

/// Normalization settings for one refresh.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub entity_field: String,
    pub duplicate_policy: DuplicatePolicy,
    /// Name blank header cells with the overflow prefix and filter every
    /// overflow-prefixed column out of the records.
    pub extended: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            entity_field: DEFAULT_ENTITY_FIELD.to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            extended: false,
        }
    }
}

/// Normalization output: records + bookkeeping about what was dropped.
#[derive(Debug, Clone)]
pub struct NormalizedData {
    pub records: RecordSet,
    pub rows_read: usize,
    /// Entity identifiers whose later rows were dropped by `DuplicatePolicy::KeepFirst`.
    pub duplicates_dropped: Vec<String>,
    /// Number of surplus cells (beyond the header width) that were discarded.
    pub overflow_cells: usize,
}

/// Which registry columns the header actually provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub entity_field_present: bool,
    pub missing_fields: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.entity_field_present && self.missing_fields.is_empty()
    }
}

/// Parse CSV text (first line = header) into a normalized record set.
///
/// Empty input yields an empty record set. This never fails: anomalies are
/// logged and degrade to empty values.
pub fn normalize_csv(text: &str, options: &NormalizeOptions) -> NormalizedData {
    let mut out = NormalizedData {
        records: RecordSet::empty(options.entity_field.clone()),
        rows_read: 0,
        duplicates_dropped: Vec::new(),
        overflow_cells: 0,
    };

    let text = text.trim();
    if text.is_empty() {
        return out;
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("failed to read CSV header: {e}");
            return out;
        }
    };

    let columns = resolve_columns(&headers, options.extended);
    // Repeated names collapse to one key, matching the record fields.
    for name in columns.iter().flatten() {
        if !out.records.headers.contains(name) {
            out.records.headers.push(name.clone());
        }
    }

    let mut seen: HashSet<String> = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and lines are 1-based.
        let line = idx + 2;
        out.rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(line, "skipping undecodable CSV row: {e}");
                continue;
            }
        };

        out.overflow_cells += row.len().saturating_sub(columns.len());

        let record = build_record(&row, &columns, &options.entity_field);

        if options.duplicate_policy == DuplicatePolicy::KeepFirst
            && !record.entity.is_empty()
            && !seen.insert(record.entity.clone())
        {
            warn!(line, entity = %record.entity, "dropping duplicate entity row (keep-first)");
            out.duplicates_dropped.push(record.entity);
            continue;
        }

        out.records.records.push(record);
    }

    if out.overflow_cells > 0 {
        debug!(cells = out.overflow_cells, "discarded surplus cells beyond header width");
    }

    out
}

/// Check the header against every column the registry reads.
pub fn validate_schema(records: &RecordSet, registry: &KpiRegistry) -> SchemaReport {
    let mut missing_fields: Vec<String> = Vec::new();
    for field in registry.source_fields() {
        if !records.has_field(field) && !missing_fields.iter().any(|f| f == field) {
            missing_fields.push(field.to_string());
        }
    }

    SchemaReport {
        entity_field_present: records.has_field(&records.entity_field),
        missing_fields,
    }
}

/// Map each header position to the field name it feeds (`None` = excluded).
fn resolve_columns(headers: &StringRecord, extended: bool) -> Vec<Option<String>> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let mut name = normalize_header_name(raw);
            if extended {
                if name.is_empty() {
                    name = format!("{OVERFLOW_PREFIX}_{idx}");
                }
                if name.starts_with(OVERFLOW_PREFIX) {
                    return None;
                }
            }
            Some(name)
        })
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes carry a UTF-8 BOM on the first header.
    name.trim_start_matches('\u{feff}').trim().to_string()
}

fn build_record(row: &StringRecord, columns: &[Option<String>], entity_field: &str) -> NormalizedRecord {
    let mut fields = BTreeMap::new();
    for (idx, column) in columns.iter().enumerate() {
        let Some(name) = column else { continue };
        let value = row.get(idx).map(str::trim).unwrap_or_default();
        // Repeated header names: the first column wins.
        fields.entry(name.clone()).or_insert_with(|| value.to_string());
    }

    let entity = fields.get(entity_field).cloned().unwrap_or_default();
    NormalizedRecord { entity, fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            entity_field: "name".to_string(),
            duplicate_policy: DuplicatePolicy::KeepAll,
            extended: false,
        }
    }

    #[test]
    fn every_row_carries_every_header_key() {
        let csv = "name, x ,y\nA,1,2\nB,3\nC\n";
        let data = normalize_csv(csv, &options());

        assert_eq!(data.rows_read, 3);
        assert_eq!(data.records.len(), 3);
        assert_eq!(data.records.headers, vec!["name", "x", "y"]);
        for r in &data.records.records {
            for h in &data.records.headers {
                assert!(r.get(h).is_some(), "missing key {h} for {}", r.entity);
            }
        }
        assert_eq!(data.records.records[1].get("y"), Some(""));
        assert_eq!(data.records.records[2].get("x"), Some(""));
        assert_eq!(data.records.records[2].get("nope"), None);
    }

    #[test]
    fn values_are_trimmed_and_surplus_fields_dropped() {
        let csv = "name,x\n  Acme  ,  $1,200  \n";
        let data = normalize_csv(csv, &options());
        let r = &data.records.records[0];
        assert_eq!(r.entity, "Acme");
        // No quote handling: the thousands separator splits the cell.
        assert_eq!(r.get("x"), Some("$1"));
        assert_eq!(r.fields.len(), 2);
        assert_eq!(data.overflow_cells, 1);
    }

    #[test]
    fn quotes_are_not_interpreted() {
        let csv = "name,x\n\"Acme, Inc\",5\n";
        let data = normalize_csv(csv, &options());
        let r = &data.records.records[0];
        assert_eq!(r.entity, "\"Acme");
        assert_eq!(r.get("x"), Some("Inc\""));
    }

    #[test]
    fn empty_and_header_only_inputs() {
        let data = normalize_csv("   \n  ", &options());
        assert!(data.records.is_empty());
        assert!(data.records.headers.is_empty());

        let data = normalize_csv("name,x\n", &options());
        assert!(data.records.is_empty());
        assert_eq!(data.records.headers, vec!["name", "x"]);
    }

    #[test]
    fn strips_bom_and_handles_crlf() {
        let csv = "\u{feff}name,x\r\nA,1\r\nB,2\r\n";
        let data = normalize_csv(csv, &options());
        assert_eq!(data.records.headers, vec!["name", "x"]);
        assert_eq!(data.records.records[1].get("x"), Some("2"));
    }

    #[test]
    fn extended_mode_filters_overflow_columns() {
        let csv = "name,x,,__parsed_extra\nA,1,junk,more\n";
        let mut opts = options();

        let plain = normalize_csv(csv, &opts);
        assert_eq!(plain.records.headers, vec!["name", "x", "", "__parsed_extra"]);

        opts.extended = true;
        let data = normalize_csv(csv, &opts);
        assert_eq!(data.records.headers, vec!["name", "x"]);
        let r = &data.records.records[0];
        assert_eq!(r.fields.len(), 2);
        assert_eq!(r.get("x"), Some("1"));
    }

    #[test]
    fn repeated_header_names_keep_the_first_column() {
        let csv = "name,x, x\nA,1,2\n";
        let data = normalize_csv(csv, &options());
        assert_eq!(data.records.headers, vec!["name", "x"]);
        let r = &data.records.records[0];
        assert_eq!(r.fields.len(), data.records.headers.len());
        assert_eq!(r.get("x"), Some("1"));
    }

    #[test]
    fn duplicate_policy() {
        let csv = "name,x\nA,1\nB,2\nA,3\n,4\n,5\n";

        let all = normalize_csv(csv, &options());
        assert_eq!(all.records.len(), 5);
        assert!(all.duplicates_dropped.is_empty());

        let mut opts = options();
        opts.duplicate_policy = DuplicatePolicy::KeepFirst;
        let first = normalize_csv(csv, &opts);
        let entities: Vec<&str> = first.records.entities().collect();
        assert_eq!(entities, vec!["A", "B", "", ""]);
        assert_eq!(first.records.find("A").unwrap().get("x"), Some("1"));
        assert_eq!(first.duplicates_dropped, vec!["A".to_string()]);
    }

    #[test]
    fn schema_report_lists_missing_registry_columns() {
        let registry = KpiRegistry::standard();
        let csv = "Organization Name,Membership Reach,Financial Health\nA,1,2\n";
        let data = normalize_csv(csv, &NormalizeOptions::default());
        let report = validate_schema(&data.records, &registry);

        assert!(report.entity_field_present);
        assert!(!report.is_complete());
        assert_eq!(report.missing_fields.len(), 5);
        assert!(report.missing_fields.contains(&"Certification Scheme Reach".to_string()));
    }
}
