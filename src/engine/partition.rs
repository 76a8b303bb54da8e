//! Range partitioning
//!
//! Splits an inclusive domain `[lower, upper]` into contiguous, disjoint partitions of
//! equal block size (the last one may be shorter). One partition is handed to one worker.

use crate::error::{EngineResult, FanjoinError};
use serde::Serialize;

/// One contiguous sub-range of the domain, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub index: usize,
    pub start: i64,
    pub end: i64,
}

impl Partition {
    /// Number of domain elements in this partition
    pub fn len(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    /// Always false: a partition holds at least one value
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn values(&self) -> std::ops::RangeInclusive<i64> {
        self.start..=self.end
    }
}

/// Why the worker count differs from what the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerAdjustment {
    pub requested: usize,
    pub effective: usize,
}

/// Output of the partitioner: the partitions plus how they were derived
#[derive(Debug, Clone, Serialize)]
pub struct PartitionPlan {
    pub lower: i64,
    pub upper: i64,
    pub block_size: u64,
    pub partitions: Vec<Partition>,
    /// Set when fewer workers than requested were needed to cover the domain
    pub adjustment: Option<WorkerAdjustment>,
}

impl PartitionPlan {
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Partition> {
        self.partitions.iter()
    }

    /// Total number of domain elements covered
    pub fn domain_size(&self) -> u64 {
        (self.upper - self.lower) as u64 + 1
    }

    /// Verify that every value of `[lower, upper]` is covered exactly once, in order
    #[cfg(test)]
    fn verify_coverage(&self) -> bool {
        let mut expected_start = self.lower as i128;
        for (i, p) in self.partitions.iter().enumerate() {
            if p.index != i || p.start as i128 != expected_start || p.start > p.end {
                return false;
            }
            expected_start = p.end as i128 + 1;
        }
        expected_start == self.upper as i128 + 1
    }
}

impl<'a> IntoIterator for &'a PartitionPlan {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Partition `[lower, upper]` across `n` workers
///
/// `n` is clamped to the domain size when it exceeds it. With ceiling block sizes a
/// request can also need fewer blocks than `n` (10 values over 6 workers gives blocks of
/// 2, so 5 partitions); trailing empty partitions are never produced. Both cases are
/// reported through [`PartitionPlan::adjustment`].
///
/// # Example
///
/// ```
/// use fanjoin::engine::partition;
///
/// let plan = partition(10, 20, 3).unwrap();
/// let bounds: Vec<_> = plan.iter().map(|p| (p.start, p.end)).collect();
/// assert_eq!(bounds, vec![(10, 13), (14, 17), (18, 20)]);
/// ```
pub fn partition(lower: i64, upper: i64, n: usize) -> EngineResult<PartitionPlan> {
    if n == 0 {
        return Err(FanjoinError::invalid("worker count must be at least 1"));
    }
    if lower < 0 || upper < 0 {
        return Err(FanjoinError::invalid(format!(
            "bounds must be non-negative, got [{lower}, {upper}]"
        )));
    }
    if lower > upper {
        return Err(FanjoinError::invalid(format!(
            "lower bound {lower} exceeds upper bound {upper}"
        )));
    }

    let domain_size = (upper - lower) as u64 + 1;
    let clamped = (n as u64).min(domain_size);
    let block_size = domain_size.div_ceil(clamped);
    let effective = domain_size.div_ceil(block_size) as usize;

    let mut partitions = Vec::with_capacity(effective);
    let mut offset = 0u64;
    while offset < domain_size {
        let len = block_size.min(domain_size - offset);
        let start = lower + offset as i64;
        partitions.push(Partition {
            index: partitions.len(),
            start,
            end: start + (len - 1) as i64,
        });
        offset += len;
    }

    let adjustment = (effective != n).then_some(WorkerAdjustment {
        requested: n,
        effective,
    });
    if let Some(adj) = adjustment {
        tracing::warn!(
            "Worker count adjusted from {} to {} for domain [{}, {}]",
            adj.requested,
            adj.effective,
            lower,
            upper
        );
    }
    tracing::debug!(
        "Partitioned [{}, {}] into {} blocks of {}",
        lower,
        upper,
        partitions.len(),
        block_size
    );

    Ok(PartitionPlan {
        lower,
        upper,
        block_size,
        partitions,
        adjustment,
    })
}
