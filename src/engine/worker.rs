//! Per-partition work
//!
//! Both variants run inside the dispatcher's worker harness and only ever see their own
//! partition: the search worker reads shared, immutable grid rows; the enumeration
//! worker writes through its own [`SlotWriter`].

use super::partition::Partition;
use super::slots::SlotWriter;
use crate::input::Grid;
use serde::Serialize;

/// Cell coordinates of a search match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

/// Trial division up to `sqrt(n)`
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d: i64 = 3;
    // d * d <= n, without overflow near i64::MAX
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Scan the partition's rows for `target`, stopping at the first hit
///
/// Partition bounds are row indices into `grid`.
pub fn search_rows(partition: &Partition, grid: &Grid, target: i64) -> Option<Location> {
    for row in partition.values() {
        let row = row as usize;
        if let Some(col) = grid.row(row).iter().position(|&cell| cell == target) {
            tracing::trace!("Partition {} matched at [{}, {}]", partition.index, row, col);
            return Some(Location { row, col });
        }
    }
    None
}

/// Write every prime of the partition into its slot, returning how many were written
pub fn enumerate_primes(partition: &Partition, slot: &mut SlotWriter<'_>) -> usize {
    for value in partition.values() {
        if is_prime(value) {
            slot.push(value);
        }
    }
    slot.written()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::partition::partition;
    use crate::engine::slots::{SharedBuffer, allocate, element_count};

    #[test]
    fn test_is_prime_small_values() {
        let primes: Vec<i64> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
    }

    #[test]
    fn test_is_prime_squares_and_large() {
        assert!(!is_prime(49));
        assert!(!is_prime(121));
        assert!(is_prime(7919));
        assert!(is_prime(2_147_483_647));
        assert!(!is_prime(i64::MAX));
    }

    #[test]
    fn test_search_rows_stops_at_first_match() {
        let grid = Grid::from_rows(vec![
            vec![0, 0, 0],
            vec![0, 1, 1],
            vec![1, 0, 0],
        ])
        .unwrap();
        let plan = partition(0, 2, 1).unwrap();

        let found = search_rows(&plan.partitions[0], &grid, 1);
        assert_eq!(found, Some(Location { row: 1, col: 1 }));
    }

    #[test]
    fn test_search_rows_only_looks_inside_partition() {
        let grid = Grid::from_rows(vec![vec![1, 0], vec![0, 0], vec![0, 0]]).unwrap();
        let plan = partition(0, 2, 3).unwrap();

        assert!(search_rows(&plan.partitions[0], &grid, 1).is_some());
        assert!(search_rows(&plan.partitions[1], &grid, 1).is_none());
        assert!(search_rows(&plan.partitions[2], &grid, 1).is_none());
    }

    #[test]
    fn test_enumerate_primes_fills_slot_and_leaves_sentinel_tail() {
        let plan = partition(10, 20, 3).unwrap();
        let layout = allocate(&plan.partitions, element_count).unwrap();
        let mut buffer = SharedBuffer::allocate(layout).unwrap();

        let counts: Vec<usize> = buffer
            .writers()
            .iter_mut()
            .zip(&plan.partitions)
            .map(|(writer, p)| enumerate_primes(p, writer))
            .collect();

        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(buffer.slot_region(0).unwrap(), &[11, 13, -1, -1]);
        assert_eq!(buffer.slot_region(1).unwrap(), &[17, -1, -1, -1]);
        assert_eq!(buffer.slot_region(2).unwrap(), &[19, -1, -1]);
    }

    #[test]
    fn test_element_count_bound_is_never_exceeded() {
        for upper in [0i64, 1, 2, 3, 5, 10, 31, 64] {
            for n in 1..=8 {
                let plan = partition(0, upper, n).unwrap();
                let layout = allocate(&plan.partitions, element_count).unwrap();
                let mut buffer = SharedBuffer::allocate(layout.clone()).unwrap();
                for (writer, p) in buffer.writers().iter_mut().zip(&plan.partitions) {
                    let written = enumerate_primes(p, writer);
                    assert!(written <= layout.slots[p.index].capacity);
                }
            }
        }
    }
}
