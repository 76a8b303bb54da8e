//! Partition, dispatch, aggregate
//!
//! A run splits its domain with [`partition`], hands each partition to one worker through
//! the [`Dispatcher`](crate::parallel::Dispatcher), and folds the barrier output into a
//! report. The shared buffer and the handle table live only for the duration of
//! [`run_primes`] or [`run_search`] and are dropped on every exit path.

pub mod aggregate;
pub mod partition;
pub mod slots;
pub mod worker;

pub use aggregate::{EnumerationReport, SearchHit, SearchReport, aggregate_enumeration, aggregate_search};
pub use partition::{Partition, PartitionPlan, WorkerAdjustment, partition};
pub use slots::{OutputSlot, SENTINEL, SharedBuffer, SlotLayout};
pub use worker::{Location, is_prime};

use crate::error::{EngineResult, FanjoinError};
use crate::input::Grid;
use crate::parallel::{Dispatcher, PartitionProgress};
use serde::Serialize;

/// Knobs shared by both run modes
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Draw a progress bar on stderr while waiting at the barrier
    pub progress: bool,
}

impl RunOptions {
    fn dispatcher(&self, partitions: usize, label: &str) -> Dispatcher {
        let dispatcher = Dispatcher::new();
        if self.progress {
            dispatcher.with_progress(PartitionProgress::new(partitions, label))
        } else {
            dispatcher
        }
    }
}

/// Result of a prime enumeration run
#[derive(Debug, Clone, Serialize)]
pub struct PrimeReport {
    pub plan: PartitionPlan,
    pub layout: SlotLayout,
    pub primes: Vec<i64>,
    pub per_partition: Vec<usize>,
}

/// Enumerate every prime in `[lower, upper]` across `workers` threads
///
/// The output is ascending, because slots are read in partition order.
pub fn run_primes(
    lower: i64,
    upper: i64,
    workers: usize,
    options: RunOptions,
) -> EngineResult<PrimeReport> {
    let plan = partition(lower, upper, workers)?;
    let layout = slots::allocate(&plan.partitions, slots::element_count)?;
    let mut buffer = SharedBuffer::allocate(layout.clone())?;

    let jobs: Vec<_> = plan.partitions.iter().copied().zip(buffer.writers()).collect();
    let ctx = options
        .dispatcher(plan.num_partitions(), "primes")
        .run(jobs, |p, mut slot| worker::enumerate_primes(p, &mut slot))?;

    let EnumerationReport {
        values,
        per_partition,
    } = aggregate_enumeration(&ctx, &buffer)?;
    tracing::info!(
        "Found {} primes in [{}, {}] with {} workers",
        values.len(),
        lower,
        upper,
        plan.num_partitions()
    );

    Ok(PrimeReport {
        plan,
        layout,
        primes: values,
        per_partition,
    })
}

/// Result of a grid search run
#[derive(Debug, Clone, Serialize)]
pub struct GridSearchReport {
    pub target: i64,
    pub plan: PartitionPlan,
    #[serde(flatten)]
    pub search: SearchReport,
}

/// Search `grid` for `target`, one row per worker unless `workers` says otherwise
///
/// Which match is reported when several rows contain the target depends on which worker
/// finished first. An explicit worker count of 0 is rejected, not defaulted.
pub fn run_search(
    grid: &Grid,
    target: i64,
    workers: Option<usize>,
    options: RunOptions,
) -> EngineResult<GridSearchReport> {
    let last_row = i64::try_from(grid.rows() - 1)
        .map_err(|_| FanjoinError::invalid(format!("grid has too many rows: {}", grid.rows())))?;
    let plan = partition(0, last_row, workers.unwrap_or(grid.rows()))?;

    let jobs: Vec<_> = plan.partitions.iter().map(|p| (*p, ())).collect();
    let ctx = options
        .dispatcher(plan.num_partitions(), "search")
        .run(jobs, |p, ()| worker::search_rows(p, grid, target))?;

    let search = aggregate_search(&ctx)?;
    match &search.hit {
        Some(hit) => tracing::info!(
            "Worker {} found {} at [{}, {}]",
            hit.owner,
            target,
            hit.location.row,
            hit.location.col
        ),
        None => tracing::info!("{} not found in {} rows", target, grid.rows()),
    }

    Ok(GridSearchReport {
        target,
        plan,
        search,
    })
}
