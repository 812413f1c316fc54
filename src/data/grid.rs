//! Grid geometry, forcing term and Dirichlet data of the model problem.
//!
//! The right-hand side and boundary values are pure functions of the global
//! grid coordinates, so each rank fills its own slab without communication.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::slab::Slab;
use crate::cg_error::CgError;
use crate::topology::RowRange;

/// `k²` of the operator `-Δ + k²`.
pub const K_SQUARED: f64 = 4.0 * PI * PI;

/// Default domain `[0, 2] x [0, 1]`.
pub const DEFAULT_LX: f64 = 2.0;
pub const DEFAULT_LY: f64 = 1.0;

/// Global grid: `Nx x Ny` intervals on `[0, Lx] x [0, Ly]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub nx: usize,
    pub ny: usize,
    pub lx: f64,
    pub ly: f64,
}

impl GridSpec {
    /// Grid on the default domain.
    pub fn new(nx: usize, ny: usize) -> Result<Self, CgError> {
        Self::with_extent(nx, ny, DEFAULT_LX, DEFAULT_LY)
    }

    pub fn with_extent(nx: usize, ny: usize, lx: f64, ly: f64) -> Result<Self, CgError> {
        let spec = Self { nx, ny, lx, ly };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), CgError> {
        if self.nx < 2 || self.ny < 2 {
            return Err(CgError::InvalidGrid {
                nx: self.nx,
                ny: self.ny,
            });
        }
        for (name, value) in [("Lx", self.lx), ("Ly", self.ly)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CgError::InvalidExtent { name, value });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn hx(&self) -> f64 {
        self.lx / self.nx as f64
    }

    #[inline]
    pub fn hy(&self) -> f64 {
        self.ly / self.ny as f64
    }

    #[inline]
    pub fn x(&self, i: usize) -> f64 {
        i as f64 * self.hx()
    }

    #[inline]
    pub fn y(&self, j: usize) -> f64 {
        j as f64 * self.hy()
    }

    /// Number of unknowns, `(Nx-1)(Ny-1)`; normalises the residual norm.
    pub fn interior_points(&self) -> usize {
        (self.nx - 1) * (self.ny - 1)
    }

    /// Forcing term `4π²·hx²·hy² · sin(2π·hx·i) · sinh(2π·hy·j)`.
    pub fn rhs_value(&self, i: usize, j: usize) -> f64 {
        let (hx, hy) = (self.hx(), self.hy());
        let temp_pi = K_SQUARED * hx * hx * hy * hy;
        temp_pi * (2.0 * PI * hx * i as f64).sin() * (2.0 * PI * hy * j as f64).sinh()
    }

    /// Dirichlet value at `(i, j)`, or `None` for an interior point.
    pub fn boundary_value(&self, i: usize, j: usize) -> Option<f64> {
        if i == 0 || i == self.nx || j == 0 {
            Some(0.0)
        } else if j == self.ny {
            Some((2.0 * PI * self.hx() * i as f64).sin() * (4.0 * PI).sinh())
        } else {
            None
        }
    }

    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        self.boundary_value(i, j).is_some()
    }
}

/// One rank's share of the unknown field `v` and the forcing term.
#[derive(Debug, Clone)]
pub struct Grid {
    spec: GridSpec,
    solution: Slab,
    rhs: Slab,
}

impl Grid {
    /// Allocate both slabs and fill forcing and boundary values.
    pub fn new(spec: GridSpec, rows: RowRange) -> Result<Self, CgError> {
        spec.validate()?;
        if rows.last() >= spec.ny {
            return Err(CgError::PartitionInvariant(format!(
                "rows {}..={} exceed the interior of a grid with Ny={}",
                rows.first(),
                rows.last(),
                spec.ny
            )));
        }
        let mut grid = Self {
            spec,
            solution: Slab::new(spec.nx, rows)?,
            rhs: Slab::new(spec.nx, rows)?,
        };
        grid.set_rhs();
        grid.set_boundary();
        Ok(grid)
    }

    /// Fill the forcing term on every stored row, ghosts included.
    pub fn set_rhs(&mut self) {
        let rows = self.rhs.rows();
        for j in rows.lower_ghost()..=rows.upper_ghost() {
            for (i, f) in self.rhs.row_mut(j).iter_mut().enumerate() {
                *f = self.spec.rhs_value(i, j);
            }
        }
    }

    /// Write Dirichlet values into every boundary point this slab stores.
    pub fn set_boundary(&mut self) {
        let rows = self.solution.rows();
        for j in rows.lower_ghost()..=rows.upper_ghost() {
            let full_row = j == 0 || j == self.spec.ny;
            let row = self.solution.row_mut(j);
            for (i, u) in row.iter_mut().enumerate() {
                if full_row || i == 0 || i == self.spec.nx {
                    if let Some(b) = self.spec.boundary_value(i, j) {
                        *u = b;
                    }
                }
            }
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn rows(&self) -> RowRange {
        self.solution.rows()
    }

    pub fn solution(&self) -> &Slab {
        &self.solution
    }

    pub fn solution_mut(&mut self) -> &mut Slab {
        &mut self.solution
    }

    pub fn rhs(&self) -> &Slab {
        &self.rhs
    }

    /// Solution value at global `(i, j)`; `j` must be owned or a ghost row.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.solution.get(i, j)
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<f64, CgError> {
        self.solution.try_get(i, j)
    }
}
