//! Layered configuration
//!
//! Built-in defaults, user and repository files, an explicit `--config` file, `FANJOIN_`
//! environment variables and command-line flags are merged with figment, in that order.

pub mod core;

pub use self::core::{
    CliOverrides, EngineConfig, FanjoinConfig, OutputConfig, OutputFormat, PrimesConfig,
    SearchConfig,
};
