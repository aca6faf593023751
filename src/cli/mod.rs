//! Command-line parsing for the KPI dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{BaselinePolicy, DEFAULT_ENTITY_FIELD, DuplicatePolicy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "kpi", version, about = "KPI dashboards from published spreadsheet CSVs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the sheet, print KPI cards, bar tables and radar profiles.
    Show(ShowArgs),
    /// Insert or update one organization's row in a sheet CSV.
    Upsert(UpsertArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Published CSV URL or local CSV path (defaults to $KPI_SHEET_URL).
    #[arg(long)]
    pub source: Option<String>,

    /// Column holding the organization name.
    #[arg(long, default_value = DEFAULT_ENTITY_FIELD)]
    pub entity_field: String,

    /// KPI registry JSON (defaults to the built-in registry).
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,

    /// Organizations to compare (repeatable). None means all.
    #[arg(short = 's', long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// Organizations to print radar profiles for (repeatable). Defaults to the first one.
    #[arg(short = 'r', long = "radar", value_name = "NAME")]
    pub radar: Vec<String>,

    /// How to treat repeated organization names.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::KeepFirst)]
    pub dedupe: DuplicatePolicy,

    /// Which population mean the average line uses.
    #[arg(long, value_enum, default_value_t = BaselinePolicy::Observed)]
    pub baseline: BaselinePolicy,

    /// Filter auto-generated overflow columns (blank or `__parsed_extra*` headers).
    #[arg(long)]
    pub extended: bool,

    /// Write the dashboard payload to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Bar width (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct UpsertArgs {
    /// Sheet CSV to update (first column = organization name).
    #[arg(long, value_name = "CSV")]
    pub sheet: PathBuf,

    /// Submission JSON file (camelCase fields, `organizationName` required).
    #[arg(long, value_name = "JSON")]
    pub submission: PathBuf,
}
