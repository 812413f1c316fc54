//! Row-block partition of the interior rows `1..=Ny-1` over `P` ranks.
//!
//! Every rank but the last owns `(Ny-1) / P` rows; the last one also takes
//! the remainder. The partition is a pure function of `(P, Ny)`.

use serde::{Deserialize, Serialize};

use crate::cg_error::CgError;
use crate::debug_invariants::DebugInvariants;

/// Inclusive range of global row indices `[first, last]` owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    first: usize,
    last: usize,
}

impl RowRange {
    /// Range `[first, last]`; fails on an empty or inverted range.
    pub fn new(first: usize, last: usize) -> Result<Self, CgError> {
        if first == 0 || first > last {
            return Err(CgError::PartitionInvariant(format!(
                "row range [{first}, {last}] is empty or touches boundary row 0"
            )));
        }
        Ok(Self { first, last })
    }

    /// First owned row (`j_init`).
    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    /// Last owned row (`j_fina`).
    #[inline]
    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of owned rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Ranges are never empty; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, j: usize) -> bool {
        (self.first..=self.last).contains(&j)
    }

    /// Row below the first owned row (ghost row).
    #[inline]
    pub fn lower_ghost(&self) -> usize {
        self.first - 1
    }

    /// Row above the last owned row (ghost row).
    #[inline]
    pub fn upper_ghost(&self) -> usize {
        self.last + 1
    }

    /// Owned rows in ascending order.
    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Rows owned by the rank at coordinate `coord` of a `size`-rank topology.
pub fn row_range(coord: usize, size: usize, ny: usize) -> Result<RowRange, CgError> {
    if size == 0 {
        return Err(CgError::NoRanks);
    }
    if coord >= size {
        return Err(CgError::RankOutOfRange { rank: coord, size });
    }
    if ny < 2 {
        return Err(CgError::InvalidGrid { nx: 0, ny });
    }
    let rows = ny - 1;
    let work_q = rows / size;
    let work_rem = rows % size;
    if work_q == 0 {
        return Err(CgError::TooManyRanks { ranks: size, rows });
    }
    let first = 1 + coord * work_q;
    let mut last = (coord + 1) * work_q;
    if coord == size - 1 {
        last += work_rem;
    }
    RowRange::new(first, last)
}

/// The complete partition of `1..=ny-1` over `size` ranks, in coordinate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPartition {
    ny: usize,
    ranges: Vec<RowRange>,
}

impl RowPartition {
    pub fn new(size: usize, ny: usize) -> Result<Self, CgError> {
        let ranges = (0..size)
            .map(|c| row_range(c, size, ny))
            .collect::<Result<Vec<_>, _>>()?;
        let part = Self { ny, ranges };
        part.debug_assert_invariants();
        Ok(part)
    }

    pub fn ranges(&self) -> &[RowRange] {
        &self.ranges
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Coordinate of the rank owning row `j`, if `j` is an interior row.
    pub fn owner_of(&self, j: usize) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(j))
    }
}

impl DebugInvariants for RowPartition {
    fn validate_invariants(&self) -> Result<(), CgError> {
        let mut expected = 1;
        for (c, r) in self.ranges.iter().enumerate() {
            if r.first() != expected {
                return Err(CgError::PartitionInvariant(format!(
                    "rank {c} starts at row {} but row {expected} is next",
                    r.first()
                )));
            }
            expected = r.last() + 1;
        }
        if expected != self.ny {
            return Err(CgError::PartitionInvariant(format!(
                "partition ends at row {} instead of {}",
                expected - 1,
                self.ny - 1
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_owns_every_interior_row() {
        let r = row_range(0, 1, 9).unwrap();
        assert_eq!((r.first(), r.last()), (1, 8));
        assert_eq!(r.lower_ghost(), 0);
        assert_eq!(r.upper_ghost(), 9);
    }

    #[test]
    fn remainder_goes_to_last_rank() {
        // 10 interior rows over 3 ranks: 3, 3, 4
        let part = RowPartition::new(3, 11).unwrap();
        let lens: Vec<_> = part.ranges().iter().map(RowRange::len).collect();
        assert_eq!(lens, vec![3, 3, 4]);
        assert_eq!(part.ranges()[2].last(), 10);
        assert_eq!(part.owner_of(7), Some(2));
        assert_eq!(part.owner_of(0), None);
        assert_eq!(part.owner_of(11), None);
    }

    #[test]
    fn too_many_ranks_is_rejected() {
        let err = row_range(0, 4, 4).unwrap_err();
        assert!(matches!(err, CgError::TooManyRanks { ranks: 4, rows: 3 }));
        assert!(RowPartition::new(4, 4).is_err());
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        assert!(matches!(row_range(0, 0, 8), Err(CgError::NoRanks)));
        assert!(matches!(
            row_range(2, 2, 8),
            Err(CgError::RankOutOfRange { rank: 2, size: 2 })
        ));
        assert!(row_range(0, 1, 1).is_err());
    }

    #[test]
    fn broken_partition_fails_validation() {
        let part = RowPartition {
            ny: 6,
            ranges: vec![RowRange::new(1, 2).unwrap(), RowRange::new(4, 5).unwrap()],
        };
        assert!(part.validate_invariants().is_err());
    }
}
