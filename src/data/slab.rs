//! Row-major 2D field slab with one ghost row on each side.
//!
//! A slab stores global columns `0..=Nx` for the rows
//! `[first - 1, last + 1]`, i.e. the rank's owned rows plus the two ghost
//! rows. All accessors take *global* grid coordinates `(i, j)`.
//!
//! The buffer is allocated once in [`Slab::new`] and never resized, so row
//! slices handed to a transport stay valid for the life of the solver.

use std::ops::{Index, IndexMut};

use crate::cg_error::CgError;
use crate::debug_invariants::DebugInvariants;
use crate::topology::RowRange;

/// Which side of the owned block a ghost row sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GhostSide {
    /// Row `first - 1`, filled from the `up` neighbour.
    Lower,
    /// Row `last + 1`, filled from the `down` neighbour.
    Upper,
}

impl GhostSide {
    pub const BOTH: [GhostSide; 2] = [GhostSide::Lower, GhostSide::Upper];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    nx: usize,
    rows: RowRange,
    values: Vec<f64>,
}

impl Slab {
    /// Zero-filled slab for `rows` on a grid with `nx` intervals per row.
    pub fn new(nx: usize, rows: RowRange) -> Result<Self, CgError> {
        let len = (nx + 1) * (rows.len() + 2);
        let mut values = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|_| CgError::Allocation { len })?;
        values.resize(len, 0.0);
        let slab = Self { nx, rows, values };
        slab.debug_assert_invariants();
        Ok(slab)
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Owned row range.
    #[inline]
    pub fn rows(&self) -> RowRange {
        self.rows
    }

    /// Values per stored row (`Nx + 1`).
    #[inline]
    pub fn width(&self) -> usize {
        self.nx + 1
    }

    /// `true` if row `j` is stored (owned or ghost).
    #[inline]
    pub fn holds_row(&self, j: usize) -> bool {
        j + 1 >= self.rows.first() && j <= self.rows.upper_ghost()
    }

    #[inline]
    fn offset(&self, j: usize) -> usize {
        debug_assert!(self.holds_row(j), "row {j} not held by slab {:?}", self.rows);
        (j - self.rows.lower_ghost()) * self.width()
    }

    /// Full stored row `j` (columns `0..=Nx`).
    ///
    /// # Panics
    /// If `j` is neither owned nor a ghost row.
    pub fn row(&self, j: usize) -> &[f64] {
        let o = self.offset(j);
        &self.values[o..o + self.nx + 1]
    }

    /// Mutable row `j`; same panics as [`Slab::row`].
    pub fn row_mut(&mut self, j: usize) -> &mut [f64] {
        let o = self.offset(j);
        let w = self.width();
        &mut self.values[o..o + w]
    }

    /// Interior columns `1..Nx` of row `j`; the part that travels in a halo message.
    pub fn interior(&self, j: usize) -> &[f64] {
        &self.row(j)[1..self.nx]
    }

    pub fn interior_mut(&mut self, j: usize) -> &mut [f64] {
        let nx = self.nx;
        &mut self.row_mut(j)[1..nx]
    }

    /// Global row index of the ghost row on `side`.
    pub fn ghost_row(&self, side: GhostSide) -> usize {
        match side {
            GhostSide::Lower => self.rows.lower_ghost(),
            GhostSide::Upper => self.rows.upper_ghost(),
        }
    }

    /// Global row index of the owned row adjacent to the ghost row on `side`.
    pub fn edge_row(&self, side: GhostSide) -> usize {
        match side {
            GhostSide::Lower => self.rows.first(),
            GhostSide::Upper => self.rows.last(),
        }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.row(j)[i]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.row_mut(j)[i] = value;
    }

    /// Checked lookup by global coordinates.
    pub fn try_get(&self, i: usize, j: usize) -> Result<f64, CgError> {
        if i > self.nx || !self.holds_row(j) {
            return Err(CgError::PointOutOfSlab {
                i,
                j,
                first: self.rows.first(),
                last: self.rows.last(),
                nx: self.nx,
            });
        }
        Ok(self.get(i, j))
    }

    /// Copy the owned interior of `other` into `self`; ghost rows and
    /// boundary columns are left alone.
    pub fn copy_owned_from(&mut self, other: &Slab) -> Result<(), CgError> {
        self.ensure_same_layout(other)?;
        for j in self.rows.iter() {
            self.interior_mut(j).copy_from_slice(other.interior(j));
        }
        Ok(())
    }

    /// `(Nx, first, last)`; two slabs with equal layouts can be combined pointwise.
    pub fn layout(&self) -> (usize, usize, usize) {
        (self.nx, self.rows.first(), self.rows.last())
    }

    pub fn ensure_same_layout(&self, other: &Slab) -> Result<(), CgError> {
        if self.layout() != other.layout() {
            return Err(CgError::SlabMismatch {
                expected: self.layout(),
                found: other.layout(),
            });
        }
        Ok(())
    }

    /// Raw storage, ghost rows included.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl Index<(usize, usize)> for Slab {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.row(j)[i]
    }
}

impl IndexMut<(usize, usize)> for Slab {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.row_mut(j)[i]
    }
}

impl DebugInvariants for Slab {
    fn validate_invariants(&self) -> Result<(), CgError> {
        let expected = (self.nx + 1) * (self.rows.len() + 2);
        if self.values.len() != expected {
            return Err(CgError::SlabMismatch {
                expected: (self.nx, self.rows.first(), self.rows.last()),
                found: (self.values.len(), 0, 0),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab(nx: usize, first: usize, last: usize) -> Slab {
        Slab::new(nx, RowRange::new(first, last).unwrap()).unwrap()
    }

    #[test]
    fn stores_owned_rows_plus_two_ghosts() {
        let s = slab(4, 3, 5);
        assert_eq!(s.as_slice().len(), 5 * 5);
        assert!(s.holds_row(2) && s.holds_row(6));
        assert!(!s.holds_row(1) && !s.holds_row(7));
        assert_eq!(s.ghost_row(GhostSide::Lower), 2);
        assert_eq!(s.ghost_row(GhostSide::Upper), 6);
        assert_eq!(s.edge_row(GhostSide::Lower), 3);
        assert_eq!(s.edge_row(GhostSide::Upper), 5);
    }

    #[test]
    fn global_coordinates_map_to_distinct_cells() {
        let mut s = slab(3, 1, 2);
        for j in 0..=3 {
            for i in 0..=3 {
                s[(i, j)] = (10 * j + i) as f64;
            }
        }
        assert_eq!(s.get(2, 0), 2.0);
        assert_eq!(s.get(1, 3), 31.0);
        assert_eq!(s.interior(2), &[21.0, 22.0]);
        assert_eq!(s.row(1).len(), 4);
    }

    #[test]
    fn try_get_rejects_points_outside_the_slab() {
        let s = slab(3, 4, 5);
        assert!(s.try_get(0, 3).is_ok());
        assert!(matches!(
            s.try_get(0, 2),
            Err(CgError::PointOutOfSlab { j: 2, .. })
        ));
        assert!(s.try_get(4, 4).is_err());
    }

    #[test]
    fn copy_owned_leaves_ghosts_and_boundary_columns() {
        let mut src = slab(3, 1, 2);
        for j in 0..=3 {
            src.row_mut(j).fill(7.0);
        }
        let mut dst = slab(3, 1, 2);
        dst.copy_owned_from(&src).unwrap();
        assert_eq!(dst.row(0), &[0.0; 4]);
        assert_eq!(dst.row(1), &[0.0, 7.0, 7.0, 0.0]);
        assert_eq!(dst.row(3), &[0.0; 4]);

        let other = slab(3, 1, 1);
        assert!(matches!(
            dst.copy_owned_from(&other),
            Err(CgError::SlabMismatch { .. })
        ));
    }
}
