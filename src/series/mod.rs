//! Chart-ready series: bars with a baseline line, and radar profiles.

pub mod bar;
pub mod radar;

pub use bar::*;
pub use radar::*;
