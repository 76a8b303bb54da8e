//! Command-line interface for fanjoin
//!
//! Argument parsing with clap, logging setup and the per-command glue that feeds the
//! engine and renders its reports.

pub mod commands;
pub mod output;

pub use commands::Cli;
pub use output::Output;
