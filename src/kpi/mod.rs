//! KPI metadata (single source of truth for titles, units and columns).

pub mod registry;

pub use registry::*;
