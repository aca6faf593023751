//! Data acquisition: published-CSV sources (URL or file).

pub mod fetch;

pub use fetch::*;
