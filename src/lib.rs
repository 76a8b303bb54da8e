//! # fanjoin - partition, fan out, join
//!
//! fanjoin splits an integer domain into contiguous partitions, runs one worker thread per
//! partition and blocks at a single barrier until every worker has terminated. Two
//! workloads are built in:
//!
//! - **Prime enumeration**: every worker writes its primes into its own fixed-capacity slot
//!   of one shared, sentinel-initialised buffer. Slots are read back in partition order, so
//!   the result is ascending regardless of which worker finished first.
//! - **Grid search**: every worker scans its rows for a target value. The first success the
//!   barrier observes wins; later successes are ignored.
//!
//! ## Quick Start
//!
//! ```bash
//! # Primes in [10, 20] with three workers
//! fanjoin primes 10 20 3
//!
//! # Find the first 1 in a 100x1000 matrix read from stdin
//! fanjoin search < matrix.txt
//! ```
//!
//! ## Library use
//!
//! ```rust
//! use fanjoin::engine::{RunOptions, run_primes};
//!
//! let report = run_primes(10, 20, 3, RunOptions::default()).unwrap();
//! assert_eq!(report.primes, vec![11, 13, 17, 19]);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod parallel;

pub use cli::{Cli, Output};
pub use config::FanjoinConfig;
pub use error::FanjoinError;

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
