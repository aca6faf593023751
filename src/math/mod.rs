//! Numeric utilities: cell coercion and radar min-max scaling.

pub mod coerce;
pub mod scale;

pub use coerce::*;
pub use scale::*;
