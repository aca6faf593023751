//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - runs the refresh pipeline on a single-threaded runtime
//! - prints the report and writes the optional export
//! - applies write-back submissions

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Command, ShowArgs, UpsertArgs};
use crate::data::{CsvFetcher, DataSource};
use crate::domain::{DashboardConfig, RadarSeries, Selection};
use crate::error::AppError;
use crate::io::export::{DashboardExport, write_dashboard_json};
use crate::io::normalize::NormalizeOptions;
use crate::io::sheet::{Submission, WriteStatus, apply_submission};
use crate::kpi::KpiRegistry;

pub mod pipeline;
pub mod session;

/// Entry point for the `kpi` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging();

    match cli.command {
        Command::Show(args) => handle_show(args),
        Command::Upsert(args) => handle_upsert(args),
    }
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout carries only the report.
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args)?;

    let registry = match &config.registry_path {
        Some(path) => KpiRegistry::from_json_file(path)?,
        None => KpiRegistry::standard(),
    };
    let registry = Arc::new(registry);

    let options = NormalizeOptions {
        entity_field: config.entity_field.clone(),
        duplicate_policy: config.duplicate_policy,
        extended: config.extended,
    };

    // The fetch is the only suspend point; everything after it is synchronous.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::config(format!("Failed to start runtime: {e}")))?;
    let fetcher = CsvFetcher::new();
    let session = runtime.block_on(pipeline::refresh(
        &fetcher,
        &config.source,
        &options,
        registry,
        config.baseline_policy,
    ));

    if session.records().is_empty() {
        warn!("no data fetched; the dashboard shows placeholders only");
    }

    let charts = session.bar_series(&config.selection);

    let radar_entities: Vec<&str> = if config.radar_entities.is_empty() {
        session.default_radar_entity().into_iter().collect()
    } else {
        config.radar_entities.iter().map(String::as_str).collect()
    };
    let radar: Vec<RadarSeries> = radar_entities
        .iter()
        .filter_map(|name| {
            let series = session.radar(name);
            if series.is_none() {
                warn!(entity = *name, "radar organization not found in data");
            }
            series
        })
        .collect();

    if let Some(text) = crate::report::format_schema_report(&session.snapshot().schema, &config.entity_field)
        .filter(|_| !session.records().headers.is_empty())
    {
        println!("{text}");
    }
    println!("{}", crate::report::format_summary(session.summary()));
    for series in &charts {
        println!("{}", crate::report::format_bar_series(series, config.bar_width));
    }
    for series in &radar {
        println!("{}", crate::report::format_radar(series));
    }

    if let Some(path) = &config.export_path {
        let snapshot = session.snapshot();
        let export = DashboardExport {
            tool: "kpi",
            generated_at: chrono::Utc::now(),
            source: &snapshot.source,
            loaded_at: snapshot.loaded_at,
            selection: config.selection.names(),
            summary: session.summary(),
            charts: &charts,
            radar: &radar,
        };
        write_dashboard_json(path, &export)?;
        info!(path = %path.display(), "dashboard exported");
    }

    Ok(())
}

fn handle_upsert(args: UpsertArgs) -> Result<(), AppError> {
    let text = std::fs::read_to_string(&args.submission).map_err(|e| {
        AppError::config(format!(
            "Failed to read submission '{}': {e}",
            args.submission.display()
        ))
    })?;
    let submission = Submission::from_json(&text)?;

    let response = apply_submission(&args.sheet, &submission);
    let json = serde_json::to_string(&response)
        .map_err(|e| AppError::config(format!("Failed to encode response: {e}")))?;
    println!("{json}");

    match response.status {
        WriteStatus::Success => Ok(()),
        WriteStatus::Error => Err(AppError::config(response.message)),
    }
}

pub fn dashboard_config_from_args(args: &ShowArgs) -> Result<DashboardConfig, AppError> {
    let source = DataSource::resolve(args.source.as_deref())?;
    Ok(DashboardConfig {
        source,
        entity_field: args.entity_field.trim().to_string(),
        registry_path: args.registry.clone(),
        selection: Selection::of(trimmed_names(&args.select)),
        radar_entities: trimmed_names(&args.radar),
        duplicate_policy: args.dedupe,
        baseline_policy: args.baseline,
        extended: args.extended,
        export_path: args.export.clone(),
        bar_width: args.width,
    })
}

fn trimmed_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn show_args(argv: &[&str]) -> ShowArgs {
        let cli = Cli::parse_from(argv.iter().copied());
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        args
    }

    #[test]
    fn config_keeps_the_resolved_source() {
        let args = show_args(&[
            "kpi",
            "show",
            "--source",
            "https://example.org/pub?output=csv",
            "-s",
            " ",
            "-s",
            " Alpha ",
        ]);
        let config = dashboard_config_from_args(&args).unwrap();
        assert_eq!(
            config.source,
            DataSource::Url("https://example.org/pub?output=csv".to_string())
        );
        assert_eq!(config.selection.names().to_vec(), vec!["Alpha".to_string()]);
    }
}
