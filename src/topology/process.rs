//! A rank's place in the 1xP process arrangement.

use serde::{Deserialize, Serialize};

use super::partition::{RowRange, row_range};
use crate::cg_error::CgError;

/// Identity, neighbours and owned rows of one rank.
///
/// `up` holds the lower row indices (coordinate `c - 1`), `down` the higher
/// ones (`c + 1`). Either is `None` at the ends of the non-periodic chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTopology {
    pub rank: usize,
    pub size: usize,
    pub coord: usize,
    pub up: Option<usize>,
    pub down: Option<usize>,
    pub rows: RowRange,
}

impl ProcessTopology {
    /// Topology where ranks and coordinates coincide, as used by the
    /// in-process transports.
    pub fn linear(rank: usize, size: usize, ny: usize) -> Result<Self, CgError> {
        let rows = row_range(rank, size, ny)?;
        Ok(Self {
            rank,
            size,
            coord: rank,
            up: rank.checked_sub(1),
            down: (rank + 1 < size).then_some(rank + 1),
            rows,
        })
    }

    /// Topology from neighbours reported by a Cartesian shift.
    pub fn from_shift(
        rank: usize,
        size: usize,
        coord: usize,
        up: Option<usize>,
        down: Option<usize>,
        ny: usize,
    ) -> Result<Self, CgError> {
        let rows = row_range(coord, size, ny)?;
        Ok(Self {
            rank,
            size,
            coord,
            up,
            down,
            rows,
        })
    }

    /// `true` for the rank whose lower ghost row is boundary row 0.
    pub fn holds_bottom_boundary(&self) -> bool {
        self.up.is_none()
    }

    /// `true` for the rank whose upper ghost row is boundary row `Ny`.
    pub fn holds_top_boundary(&self) -> bool {
        self.down.is_none()
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }
}
