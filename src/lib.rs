//! `kpi-dashboard` library crate.
//!
//! The binary (`kpi`) is a thin wrapper around this library so that:
//!
//! - the CSV-to-KPI pipeline is testable without spawning processes
//! - rendering front-ends (terminal report, JSON consumers) share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod kpi;
pub mod math;
pub mod report;
pub mod series;
