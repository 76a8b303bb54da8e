//! Output slot allocation and the shared result buffer
//!
//! Enumeration workers produce a variable number of values. Each partition gets a
//! fixed-capacity slot in one contiguous buffer, sized by a worst-case bound, so every
//! worker writes its own region with no locking. The buffer is filled with [`SENTINEL`]
//! before any worker runs; a slot's real output ends at its first sentinel (or at its
//! capacity when completely full).

use super::partition::Partition;
use crate::error::{EngineResult, FanjoinError};
use serde::Serialize;

/// Marks "no more output" inside a slot. Never a valid result (results are non-negative).
pub const SENTINEL: i64 = -1;

/// A worker's exclusive region of the shared buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputSlot {
    pub index: usize,
    pub base: usize,
    pub capacity: usize,
}

impl OutputSlot {
    pub fn end(&self) -> usize {
        self.base + self.capacity
    }
}

/// Gap-free layout of all slots, in partition order
#[derive(Debug, Clone, Serialize)]
pub struct SlotLayout {
    pub slots: Vec<OutputSlot>,
    pub total: usize,
}

/// Lay out one slot per partition
///
/// `max_per_partition` must return an upper bound on how many values the partition's
/// worker can ever write. Slot `i` starts where slot `i - 1` ends.
pub fn allocate<F>(partitions: &[Partition], max_per_partition: F) -> EngineResult<SlotLayout>
where
    F: Fn(&Partition) -> u64,
{
    let mut slots = Vec::with_capacity(partitions.len());
    let mut total: usize = 0;

    for partition in partitions {
        let bound = max_per_partition(partition);
        let capacity = usize::try_from(bound).map_err(|_| FanjoinError::AllocationFailure {
            requested: usize::MAX,
            reason: format!(
                "partition {} needs {} slots, more than addressable",
                partition.index, bound
            ),
        })?;
        let base = total;
        total = total
            .checked_add(capacity)
            .ok_or_else(|| FanjoinError::AllocationFailure {
                requested: usize::MAX,
                reason: "total buffer size overflows".to_string(),
            })?;
        slots.push(OutputSlot {
            index: partition.index,
            base,
            capacity,
        });
    }

    Ok(SlotLayout { slots, total })
}

/// Bound used for prime enumeration: a partition holds at most as many primes as values
pub fn element_count(partition: &Partition) -> u64 {
    partition.len()
}

/// Sentinel-initialised buffer backing every slot of one run
#[derive(Debug)]
pub struct SharedBuffer {
    cells: Vec<i64>,
    layout: SlotLayout,
}

impl SharedBuffer {
    /// Allocate `layout.total` cells, all set to [`SENTINEL`]
    pub fn allocate(layout: SlotLayout) -> EngineResult<Self> {
        let mut cells: Vec<i64> = Vec::new();
        cells
            .try_reserve_exact(layout.total)
            .map_err(|e| FanjoinError::AllocationFailure {
                requested: layout.total,
                reason: e.to_string(),
            })?;
        cells.resize(layout.total, SENTINEL);
        tracing::debug!(
            "Allocated shared buffer: {} cells across {} slots",
            layout.total,
            layout.slots.len()
        );
        Ok(Self { cells, layout })
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Split the buffer into one writer per slot
    ///
    /// The writers borrow disjoint sub-slices, so each can move to its own thread.
    pub fn writers(&mut self) -> Vec<SlotWriter<'_>> {
        let mut writers = Vec::with_capacity(self.layout.slots.len());
        let mut rest: &mut [i64] = &mut self.cells;
        for slot in &self.layout.slots {
            let (region, tail) = std::mem::take(&mut rest).split_at_mut(slot.capacity);
            writers.push(SlotWriter {
                slot: *slot,
                cells: region,
                cursor: 0,
            });
            rest = tail;
        }
        writers
    }

    /// The whole region of a slot, sentinels included
    pub fn slot_region(&self, index: usize) -> Option<&[i64]> {
        let slot = self.layout.slots.get(index)?;
        Some(&self.cells[slot.base..slot.end()])
    }

    /// The values a worker wrote: everything before the first sentinel, at most `capacity`
    pub fn read_slot(&self, index: usize) -> Option<&[i64]> {
        let region = self.slot_region(index)?;
        let used = region
            .iter()
            .position(|&v| v == SENTINEL)
            .unwrap_or(region.len());
        Some(&region[..used])
    }
}

/// Append-only view of one slot, owned by exactly one worker
#[derive(Debug)]
pub struct SlotWriter<'a> {
    slot: OutputSlot,
    cells: &'a mut [i64],
    cursor: usize,
}

impl SlotWriter<'_> {
    /// Write the next value. Panics if the slot's capacity bound was wrong.
    pub fn push(&mut self, value: i64) {
        assert!(
            self.cursor < self.cells.len(),
            "slot {} overflowed its capacity of {}",
            self.slot.index,
            self.slot.capacity
        );
        debug_assert_ne!(value, SENTINEL, "sentinel written as a value");
        self.cells[self.cursor] = value;
        self.cursor += 1;
    }

    pub fn written(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.cells.len() - self.cursor
    }
}
