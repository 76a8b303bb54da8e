use super::progress::PartitionProgress;
use crate::engine::partition::Partition;
use crate::error::{EngineResult, FanjoinError};
use crossbeam::channel::{Receiver, Sender, unbounded};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one spawned worker
///
/// Handles are unique for the life of the process and carry no partition information;
/// the partition is only recoverable through the [`HandleTable`] built at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkerHandle(u64);

impl WorkerHandle {
    fn next() -> Self {
        WorkerHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to partition index mapping, owned by one run
#[derive(Debug, Default, Clone)]
pub struct HandleTable {
    entries: HashMap<WorkerHandle, usize>,
}

impl HandleTable {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, handle: WorkerHandle, partition: usize) {
        self.entries.insert(handle, partition);
    }

    pub fn partition_of(&self, handle: WorkerHandle) -> Option<usize> {
        self.entries.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a worker terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome<R> {
    Finished(R),
    /// The worker panicked; its partition has no answer
    Failed(String),
}

impl<R> WorkerOutcome<R> {
    pub fn is_finished(&self) -> bool {
        matches!(self, WorkerOutcome::Finished(_))
    }
}

/// One completion, as observed by the barrier
#[derive(Debug, Clone)]
pub struct Completion<R> {
    pub handle: WorkerHandle,
    pub outcome: WorkerOutcome<R>,
}

/// Everything the aggregator needs after the barrier
///
/// `completions` is in observed completion order, not partition order.
#[derive(Debug, Clone)]
pub struct RunContext<R> {
    pub table: HandleTable,
    pub completions: Vec<Completion<R>>,
}

impl<R> RunContext<R> {
    pub fn workers(&self) -> usize {
        self.table.len()
    }

    /// Partition indices of failed workers, ascending
    pub fn failed_partitions(&self) -> Vec<usize> {
        let mut failed: Vec<usize> = self
            .completions
            .iter()
            .filter(|c| !c.outcome.is_finished())
            .filter_map(|c| self.table.partition_of(c.handle))
            .collect();
        failed.sort_unstable();
        failed
    }
}

/// Spawns one OS thread per partition and waits for all of them
///
/// Threads are scoped, so workers may borrow the grid or a slot of the shared buffer
/// directly; nothing outlives [`Dispatcher::run`].
#[derive(Default)]
pub struct Dispatcher {
    progress: Option<PartitionProgress>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: PartitionProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run `work` once per job, each on its own thread, then block until every worker
    /// has terminated
    ///
    /// A panicking worker is recorded as [`WorkerOutcome::Failed`] and the barrier keeps
    /// waiting for the rest. If a thread cannot be spawned, the workers already running
    /// are joined and the run fails with [`FanjoinError::SpawnFailure`].
    pub fn run<J, R, F>(&mut self, jobs: Vec<(Partition, J)>, work: F) -> EngineResult<RunContext<R>>
    where
        J: Send,
        R: Send,
        F: Fn(&Partition, J) -> R + Sync,
    {
        let total = jobs.len();
        let work = &work;
        let (completion_tx, completion_rx) = unbounded::<Completion<R>>();
        let progress = &mut self.progress;

        tracing::debug!("Dispatching {} workers", total);

        let scoped = crossbeam::thread::scope(move |s| -> EngineResult<RunContext<R>> {
            let mut table = HandleTable::with_capacity(total);
            let mut joins = Vec::with_capacity(total);

            for (partition, job) in jobs {
                let handle = WorkerHandle::next();
                let tx = completion_tx.clone();
                let spawned = s
                    .builder()
                    .name(format!("fanjoin-worker-{}", partition.index))
                    .spawn(move |_| run_worker(handle, &partition, job, work, &tx));

                match spawned {
                    Ok(join) => {
                        table.insert(handle, partition.index);
                        joins.push(join);
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to spawn worker for partition {}: {}",
                            partition.index,
                            e
                        );
                        drop(completion_tx);
                        for join in joins {
                            let _ = join.join();
                        }
                        return Err(FanjoinError::SpawnFailure {
                            partition: partition.index,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            drop(completion_tx);

            let completions = barrier(&completion_rx, &table, total, progress.as_mut());

            // Panics were already caught inside the worker
            for join in joins {
                let _ = join.join();
            }

            Ok(RunContext {
                table,
                completions: completions?,
            })
        });

        if let Some(progress) = &self.progress {
            progress.finish();
        }

        scoped.map_err(|_| FanjoinError::WaitFailure("worker scope terminated abnormally".into()))?
    }
}

fn run_worker<J, R, F>(
    handle: WorkerHandle,
    partition: &Partition,
    job: J,
    work: &F,
    tx: &Sender<Completion<R>>,
) where
    F: Fn(&Partition, J) -> R,
{
    tracing::trace!("Worker {} started on partition {}", handle, partition.index);
    let outcome = match catch_unwind(AssertUnwindSafe(|| work(partition, job))) {
        Ok(result) => WorkerOutcome::Finished(result),
        Err(payload) => WorkerOutcome::Failed(panic_message(payload.as_ref())),
    };
    // The receiver only goes away once the barrier is done with it
    let _ = tx.send(Completion { handle, outcome });
}

/// Collect exactly `total` completions, in whatever order they arrive
fn barrier<R>(
    rx: &Receiver<Completion<R>>,
    table: &HandleTable,
    total: usize,
    mut progress: Option<&mut PartitionProgress>,
) -> EngineResult<Vec<Completion<R>>> {
    let mut completions = Vec::with_capacity(total);
    while completions.len() < total {
        let completion = rx.recv().map_err(|_| {
            FanjoinError::WaitFailure(format!(
                "completion channel closed after {} of {} workers",
                completions.len(),
                total
            ))
        })?;

        let partition = table.partition_of(completion.handle).ok_or_else(|| {
            FanjoinError::WaitFailure(format!("completion from unknown worker {}", completion.handle))
        })?;
        match &completion.outcome {
            WorkerOutcome::Finished(_) => {
                tracing::debug!("Worker {} (partition {}) finished", completion.handle, partition);
            }
            WorkerOutcome::Failed(reason) => {
                tracing::warn!(
                    "Worker {} (partition {}) failed: {}",
                    completion.handle,
                    partition,
                    reason
                );
            }
        }
        if let Some(progress) = progress.as_deref_mut() {
            progress.record(partition, completion.outcome.is_finished());
        }
        completions.push(completion);
    }
    Ok(completions)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Default worker count from available cores
///
/// `thread_percentage` of the logical CPUs, at least 1, capped by `max_threads` when
/// that is non-zero.
pub fn calculate_optimal_workers(max_threads: usize, thread_percentage: u8) -> usize {
    let available_cores = num_cpus::get();
    let by_percentage = std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

    if max_threads > 0 {
        std::cmp::min(max_threads, by_percentage)
    } else {
        by_percentage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::partition::partition;
    use std::collections::HashSet;

    fn unit_jobs(lower: i64, upper: i64, n: usize) -> Vec<(Partition, ())> {
        partition(lower, upper, n)
            .unwrap()
            .partitions
            .into_iter()
            .map(|p| (p, ()))
            .collect()
    }

    #[test]
    fn test_one_completion_per_partition() {
        let mut dispatcher = Dispatcher::new();
        let ctx = dispatcher
            .run(unit_jobs(0, 99, 8), |p, ()| p.values().sum::<i64>())
            .unwrap();

        assert_eq!(ctx.completions.len(), 8);
        assert_eq!(ctx.workers(), 8);

        let mut seen: Vec<usize> = ctx
            .completions
            .iter()
            .map(|c| ctx.table.partition_of(c.handle).unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());

        let total: i64 = ctx
            .completions
            .iter()
            .map(|c| match c.outcome {
                WorkerOutcome::Finished(sum) => sum,
                WorkerOutcome::Failed(_) => 0,
            })
            .sum();
        assert_eq!(total, (0..=99).sum::<i64>());
    }

    #[test]
    fn test_handles_are_unique_across_runs() {
        let mut dispatcher = Dispatcher::new();
        let a = dispatcher.run(unit_jobs(0, 9, 5), |_, ()| ()).unwrap();
        let b = dispatcher.run(unit_jobs(0, 9, 5), |_, ()| ()).unwrap();

        let handles: HashSet<WorkerHandle> = a
            .completions
            .iter()
            .chain(b.completions.iter())
            .map(|c| c.handle)
            .collect();
        assert_eq!(handles.len(), 10);
        assert!(b.completions.iter().all(|c| a.table.partition_of(c.handle).is_none()));
    }

    #[test]
    fn test_failed_worker_does_not_stop_barrier() {
        let mut dispatcher = Dispatcher::new();
        let ctx = dispatcher
            .run(unit_jobs(0, 3, 4), |p, ()| {
                if p.index == 2 {
                    panic!("partition two exploded");
                }
                p.index
            })
            .unwrap();

        assert_eq!(ctx.completions.len(), 4);
        assert_eq!(ctx.failed_partitions(), vec![2]);
        let failure = ctx
            .completions
            .iter()
            .find(|c| !c.outcome.is_finished())
            .unwrap();
        assert_eq!(
            failure.outcome,
            WorkerOutcome::Failed("partition two exploded".to_string())
        );
    }

    #[test]
    fn test_workers_can_borrow_and_mutate_disjoint_state() {
        let mut cells = vec![0i64; 4];
        let jobs: Vec<(Partition, &mut i64)> = partition(0, 3, 4)
            .unwrap()
            .partitions
            .into_iter()
            .zip(cells.iter_mut())
            .collect();

        Dispatcher::new()
            .run(jobs, |p, cell| *cell = p.start * 10)
            .unwrap();
        assert_eq!(cells, vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_progress_sees_every_completion() {
        let mut dispatcher = Dispatcher::new().with_progress(PartitionProgress::hidden(6));
        dispatcher.run(unit_jobs(0, 5, 6), |_, ()| ()).unwrap();
        assert_eq!(dispatcher.progress.as_ref().map(|p| p.position()), Some(6));
    }

    #[test]
    fn test_empty_job_list() {
        let ctx = Dispatcher::new().run(Vec::<(Partition, ())>::new(), |_, ()| ()).unwrap();
        assert!(ctx.completions.is_empty());
        assert!(ctx.table.is_empty());
    }

    #[test]
    fn test_calculate_optimal_workers() {
        assert!(calculate_optimal_workers(0, 75) >= 1);
        assert!(calculate_optimal_workers(2, 100) <= 2);
        assert_eq!(calculate_optimal_workers(1, 1), 1);
    }
}
