//! Worker dispatch and the completion barrier
//!
//! This module knows nothing about primes or grids. It runs one closure per partition on
//! its own thread, tags every worker with a [`WorkerHandle`], and blocks until all of them
//! have reported back.
//!
//! ```text
//! ┌──────────────┐  spawn   ┌──────────┐  Completion  ┌──────────────┐
//! │ coordinator  │─────────▶│ worker i │─────────────▶│   barrier    │
//! │ handle table │          │ (thread) │   channel    │ (n receives) │
//! └──────────────┘          └──────────┘              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use fanjoin::engine::partition;
//! use fanjoin::parallel::{Dispatcher, WorkerOutcome};
//!
//! let plan = partition(1, 100, 4).unwrap();
//! let jobs = plan.partitions.into_iter().map(|p| (p, ())).collect();
//! let ctx = Dispatcher::new()
//!     .run(jobs, |p, ()| p.values().sum::<i64>())
//!     .unwrap();
//!
//! let total: i64 = ctx
//!     .completions
//!     .iter()
//!     .filter_map(|c| match c.outcome {
//!         WorkerOutcome::Finished(sum) => Some(sum),
//!         WorkerOutcome::Failed(_) => None,
//!     })
//!     .sum();
//! assert_eq!(total, 5050);
//! ```

pub mod core;
pub mod progress;

pub use self::core::{
    Completion, Dispatcher, HandleTable, RunContext, WorkerHandle, WorkerOutcome,
    calculate_optimal_workers,
};
pub use progress::PartitionProgress;
