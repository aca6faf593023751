//! Shared refresh pipeline used by every front-end.
//!
//! A refresh has two stages:
//!
//! 1. an async boundary that fetches CSV text and turns it into an immutable
//!    `Snapshot` (fetch failures degrade to an empty snapshot)
//! 2. synchronous, restartable stages that derive everything else from it
//!    (`DashboardSession::new`)
//!
//! Nothing suspends once the data has landed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::app::session::DashboardSession;
use crate::data::{CsvFetcher, DataSource};
use crate::domain::{BaselinePolicy, RecordSet};
use crate::io::normalize::{NormalizeOptions, SchemaReport, normalize_csv, validate_schema};
use crate::kpi::KpiRegistry;

/// The immutable record set of one refresh cycle plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub records: Arc<RecordSet>,
    pub schema: SchemaReport,
    pub rows_read: usize,
    pub duplicates_dropped: Vec<String>,
    /// Set when the fetch failed and the snapshot is empty because of it.
    pub transport_error: Option<String>,
}

/// Fetch and normalize one snapshot. Never fails: transport errors are
/// logged and produce an empty record set.
pub async fn load_snapshot(
    fetcher: &CsvFetcher,
    source: &DataSource,
    options: &NormalizeOptions,
    registry: &KpiRegistry,
) -> Snapshot {
    let label = source.label();
    match fetcher.fetch_text(source).await {
        Ok(text) => snapshot_from_text(label, &text, options, registry),
        Err(e) => {
            warn!(source = %label, "fetch failed, continuing with empty data: {e}");
            let mut snapshot = snapshot_from_text(label, "", options, registry);
            snapshot.transport_error = Some(e.to_string());
            snapshot
        }
    }
}

/// Normalize already-fetched CSV text into a snapshot.
pub fn snapshot_from_text(
    source: String,
    text: &str,
    options: &NormalizeOptions,
    registry: &KpiRegistry,
) -> Snapshot {
    let data = normalize_csv(text, options);
    let schema = validate_schema(&data.records, registry);

    if !data.records.headers.is_empty() {
        if !schema.entity_field_present {
            warn!(field = %options.entity_field, "entity column missing from sheet header");
        }
        for field in &schema.missing_fields {
            warn!(%field, "KPI column missing from sheet header");
        }
    }

    info!(
        source = %source,
        rows = data.rows_read,
        records = data.records.len(),
        duplicates = data.duplicates_dropped.len(),
        "snapshot loaded"
    );

    Snapshot {
        source,
        loaded_at: Utc::now(),
        records: Arc::new(data.records),
        schema,
        rows_read: data.rows_read,
        duplicates_dropped: data.duplicates_dropped,
        transport_error: None,
    }
}

/// Full refresh: a new snapshot and a new session built from it.
pub async fn refresh(
    fetcher: &CsvFetcher,
    source: &DataSource,
    options: &NormalizeOptions,
    registry: Arc<KpiRegistry>,
    baseline_policy: BaselinePolicy,
) -> DashboardSession {
    let snapshot = load_snapshot(fetcher, source, options, &registry).await;
    DashboardSession::new(snapshot, registry, baseline_policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn failed_fetch_yields_an_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::File(dir.path().join("missing.csv"));
        let session = refresh(
            &CsvFetcher::new(),
            &source,
            &NormalizeOptions::default(),
            Arc::new(KpiRegistry::standard()),
            BaselinePolicy::Observed,
        )
        .await;

        assert!(session.snapshot().transport_error.is_some());
        assert_eq!(session.summary().total_orgs, 0);
        assert!(session.summary().kpis.iter().all(|k| k.mean.is_none()));
        assert!(session.scales().is_empty());
    }

    #[tokio::test]
    async fn http_error_status_yields_an_empty_session() {
        let url = crate::data::fetch::tests::serve_status_once("404 Not Found");
        let session = refresh(
            &CsvFetcher::new(),
            &DataSource::Url(url),
            &NormalizeOptions::default(),
            Arc::new(KpiRegistry::standard()),
            BaselinePolicy::Observed,
        )
        .await;

        let snapshot = session.snapshot();
        assert!(snapshot.transport_error.as_deref().is_some_and(|e| e.contains("404")));
        assert!(snapshot.records.is_empty());
        assert_eq!(session.summary().total_orgs, 0);
    }

    #[tokio::test]
    async fn file_refresh_builds_a_populated_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Organization Name,Membership Reach,Financial Health\nAlpha,120,$2500\nBeta,80,$1500\n"
        )
        .unwrap();

        let session = refresh(
            &CsvFetcher::new(),
            &DataSource::File(file.path().to_path_buf()),
            &NormalizeOptions::default(),
            Arc::new(KpiRegistry::standard()),
            BaselinePolicy::Observed,
        )
        .await;

        assert!(session.snapshot().transport_error.is_none());
        assert_eq!(session.summary().total_orgs, 2);
        assert_eq!(session.snapshot().schema.missing_fields.len(), 5);
        let membership = &session.summary().kpis[0];
        assert_eq!(membership.mean, Some(100.0));
    }
}
