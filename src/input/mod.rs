//! Input glue consumed by the engine
//!
//! Numeric command-line bounds and the whitespace-separated matrix read by search mode.

pub mod grid;
pub mod numeric;

pub use grid::Grid;
pub use numeric::{parse_bound, parse_count};
