//! Input/output helpers.
//!
//! - CSV ingest + normalization (`normalize`)
//! - dashboard JSON export (`export`)
//! - write-back sheet upsert (`sheet`)

pub mod export;
pub mod normalize;
pub mod sheet;

pub use export::*;
pub use normalize::*;
pub use sheet::*;
