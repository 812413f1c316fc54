//! Command line and validated run configuration.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::cg_error::CgError;
use crate::data::grid::{DEFAULT_LX, DEFAULT_LY, GridSpec};
use crate::topology::row_range;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "halo-cg",
    version,
    about = "Conjugate-gradient solve of -Δu + 4π²u = f on a row-partitioned grid",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// Intervals along x
    pub nx: usize,
    /// Intervals along y; rows 1..Ny-1 are split across ranks
    pub ny: usize,
    /// Maximum number of CG iterations
    pub k_max: usize,
    /// Tolerance on the RMS residual
    pub eps: f64,

    /// Domain length along x
    #[arg(long, default_value_t = DEFAULT_LX)]
    pub lx: f64,

    /// Domain length along y
    #[arg(long, default_value_t = DEFAULT_LY)]
    pub ly: f64,

    /// Write `x y u(x,y)` lines to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// In-process ranks (ignored when running under MPI)
    #[arg(short = 'p', long, default_value_t = 1)]
    pub ranks: usize,

    /// Print per-phase wall-clock times
    #[arg(long)]
    pub timings: bool,
}

/// Everything a rank needs to run one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub grid: GridSpec,
    pub k_max: usize,
    pub eps: f64,
    pub ranks: usize,
    pub output: Option<PathBuf>,
    pub timings: bool,
}

impl SolverConfig {
    pub fn new(grid: GridSpec, k_max: usize, eps: f64) -> Self {
        Self {
            grid,
            k_max,
            eps,
            ranks: 1,
            output: None,
            timings: false,
        }
    }

    pub fn with_ranks(mut self, ranks: usize) -> Self {
        self.ranks = ranks;
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Check the grid, tolerance and that `ranks` can share the interior rows.
    pub fn validate(&self) -> Result<(), CgError> {
        self.grid.validate()?;
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(CgError::InvalidTolerance(self.eps));
        }
        self.validate_ranks(self.ranks)
    }

    /// Same rank check for a process count decided elsewhere (MPI world size).
    pub fn validate_ranks(&self, ranks: usize) -> Result<(), CgError> {
        row_range(0, ranks, self.grid.ny).map(|_| ())
    }
}

impl TryFrom<Cli> for SolverConfig {
    type Error = CgError;

    fn try_from(cli: Cli) -> Result<Self, CgError> {
        let grid = GridSpec::with_extent(cli.nx, cli.ny, cli.lx, cli.ly)?;
        let config = SolverConfig {
            grid,
            k_max: cli.k_max,
            eps: cli.eps,
            ranks: cli.ranks,
            output: cli.output,
            timings: cli.timings,
        };
        config.validate()?;
        Ok(config)
    }
}
