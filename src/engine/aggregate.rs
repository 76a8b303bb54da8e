//! Turning barrier output into a run result
//!
//! Search keeps the first success in observed completion order. Enumeration ignores
//! completion order entirely and reads the shared buffer slot by slot.

use super::slots::SharedBuffer;
use super::worker::Location;
use crate::error::{EngineResult, FanjoinError};
use crate::parallel::{RunContext, WorkerHandle, WorkerOutcome};
use serde::Serialize;

/// The winning worker of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub owner: WorkerHandle,
    pub partition: usize,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// `None` is "not found", a valid result
    pub hit: Option<SearchHit>,
    pub workers: usize,
    /// Partitions whose worker failed, ascending
    pub failed: Vec<usize>,
}

impl SearchReport {
    pub fn found(&self) -> bool {
        self.hit.is_some()
    }
}

/// Pick the first successful completion as the winner; later successes are ignored
///
/// With no winner, any failed worker turns the result into
/// [`FanjoinError::WorkerFailure`]: its rows might have held the target.
pub fn aggregate_search(ctx: &RunContext<Option<Location>>) -> EngineResult<SearchReport> {
    let mut hit = None;
    for completion in &ctx.completions {
        let WorkerOutcome::Finished(Some(location)) = completion.outcome else {
            continue;
        };
        if hit.is_some() {
            tracing::debug!(
                "Ignoring later match from worker {} at [{}, {}]",
                completion.handle,
                location.row,
                location.col
            );
            continue;
        }
        let partition = ctx.table.partition_of(completion.handle).ok_or_else(|| {
            FanjoinError::WaitFailure(format!("no partition recorded for worker {}", completion.handle))
        })?;
        hit = Some(SearchHit {
            owner: completion.handle,
            partition,
            location,
        });
    }

    let failed = ctx.failed_partitions();
    if hit.is_none() && !failed.is_empty() {
        return Err(FanjoinError::WorkerFailure(failed));
    }

    Ok(SearchReport {
        hit,
        workers: ctx.workers(),
        failed,
    })
}

/// Values of an enumeration run, concatenated in partition order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumerationReport {
    pub values: Vec<i64>,
    /// How many values each partition contributed, by partition index
    pub per_partition: Vec<usize>,
}

/// Read every slot in partition order, up to its first sentinel
///
/// Any failed worker makes the whole run fail: its slot may be partially written and
/// there is no way to tell a short answer from an interrupted one.
pub fn aggregate_enumeration(
    ctx: &RunContext<usize>,
    buffer: &SharedBuffer,
) -> EngineResult<EnumerationReport> {
    let failed = ctx.failed_partitions();
    if !failed.is_empty() {
        return Err(FanjoinError::WorkerFailure(failed));
    }

    let slots = buffer.layout().slots.len();
    let mut values = Vec::new();
    let mut per_partition = Vec::with_capacity(slots);
    for index in 0..slots {
        let written = buffer.read_slot(index).unwrap_or_default();
        per_partition.push(written.len());
        values.extend_from_slice(written);
    }

    Ok(EnumerationReport {
        values,
        per_partition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::partition::{Partition, partition};
    use crate::engine::slots::{allocate, element_count};
    use crate::engine::worker::enumerate_primes;
    use crate::parallel::Dispatcher;

    fn primes_run(lower: i64, upper: i64, n: usize) -> (RunContext<usize>, SharedBuffer) {
        let plan = partition(lower, upper, n).unwrap();
        let layout = allocate(&plan.partitions, element_count).unwrap();
        let mut buffer = SharedBuffer::allocate(layout).unwrap();
        let jobs = plan.partitions.iter().copied().zip(buffer.writers()).collect();
        let ctx = Dispatcher::new()
            .run(jobs, |p: &Partition, mut slot| enumerate_primes(p, &mut slot))
            .unwrap();
        (ctx, buffer)
    }

    #[test]
    fn test_enumeration_is_partition_ordered() {
        let (ctx, buffer) = primes_run(10, 20, 3);
        let report = aggregate_enumeration(&ctx, &buffer).unwrap();
        assert_eq!(report.values, vec![11, 13, 17, 19]);
        assert_eq!(report.per_partition, vec![2, 1, 1]);
    }

    #[test]
    fn test_enumeration_ignores_completion_order() {
        let (ctx, buffer) = primes_run(0, 200, 7);
        let expected = aggregate_enumeration(&ctx, &buffer).unwrap();

        let mut reversed = ctx.clone();
        reversed.completions.reverse();
        let mut rotated = ctx.clone();
        rotated.completions.rotate_left(3);

        assert_eq!(aggregate_enumeration(&reversed, &buffer).unwrap(), expected);
        assert_eq!(aggregate_enumeration(&rotated, &buffer).unwrap(), expected);
        assert!(expected.values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_enumeration_fails_on_worker_failure() {
        let (mut ctx, buffer) = primes_run(0, 20, 3);
        ctx.completions[1].outcome = WorkerOutcome::Failed("boom".to_string());
        let failed_partition = ctx.table.partition_of(ctx.completions[1].handle).unwrap();

        assert_eq!(
            aggregate_enumeration(&ctx, &buffer),
            Err(FanjoinError::WorkerFailure(vec![failed_partition]))
        );
    }

    fn search_ctx(outcomes: Vec<WorkerOutcome<Option<Location>>>) -> RunContext<Option<Location>> {
        let jobs = partition(0, outcomes.len() as i64 - 1, outcomes.len())
            .unwrap()
            .partitions
            .into_iter()
            .map(|p| (p, ()))
            .collect();
        let mut ctx = Dispatcher::new().run(jobs, |_, ()| None).unwrap();
        // Replace outcomes in observed order so the test controls who finished first
        for (completion, outcome) in ctx.completions.iter_mut().zip(outcomes) {
            completion.outcome = outcome;
        }
        ctx
    }

    #[test]
    fn test_first_observed_success_wins() {
        let late = Location { row: 0, col: 1 };
        let early = Location { row: 9, col: 9 };
        let ctx = search_ctx(vec![
            WorkerOutcome::Finished(None),
            WorkerOutcome::Finished(Some(early)),
            WorkerOutcome::Finished(Some(late)),
        ]);

        let report = aggregate_search(&ctx).unwrap();
        let hit = report.hit.unwrap();
        assert_eq!(hit.location, early);
        assert_eq!(hit.owner, ctx.completions[1].handle);
        assert_eq!(Some(hit.partition), ctx.table.partition_of(hit.owner));
    }

    #[test]
    fn test_not_found_is_a_result() {
        let ctx = search_ctx(vec![WorkerOutcome::Finished(None); 4]);
        let report = aggregate_search(&ctx).unwrap();
        assert!(!report.found());
        assert!(report.failed.is_empty());
        assert_eq!(report.workers, 4);
    }

    #[test]
    fn test_failure_without_hit_is_worker_failure() {
        let ctx = search_ctx(vec![
            WorkerOutcome::Failed("boom".to_string()),
            WorkerOutcome::Finished(None),
        ]);
        let failed_partition = ctx.table.partition_of(ctx.completions[0].handle).unwrap();

        assert_eq!(
            aggregate_search(&ctx),
            Err(FanjoinError::WorkerFailure(vec![failed_partition]))
        );
    }

    #[test]
    fn test_failures_are_recorded_alongside_a_hit() {
        let found = Location { row: 1, col: 0 };
        let ctx = search_ctx(vec![
            WorkerOutcome::Failed("boom".to_string()),
            WorkerOutcome::Finished(Some(found)),
        ]);
        let report = aggregate_search(&ctx).unwrap();
        assert_eq!(report.hit.map(|h| h.location), Some(found));
        assert_eq!(report.failed.len(), 1);
    }
}
