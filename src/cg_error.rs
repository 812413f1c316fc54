//! CgError: Unified error type for halo-cg public APIs
//!
//! Every fallible operation in the crate (configuration, topology setup,
//! slab allocation, halo exchange, solution output) reports through this
//! enum. Numerical stagnation and non-convergence are *not* errors; they are
//! terminal states of the solver (see [`crate::solver::SolveStatus`]).

use thiserror::Error;

/// Unified error type for halo-cg operations.
#[derive(Debug, Error)]
pub enum CgError {
    /// The grid is too small to hold a single interior unknown.
    #[error("Invalid grid size: Nx={nx}, Ny={ny} (both must be >= 2)")]
    InvalidGrid { nx: usize, ny: usize },
    /// Domain extents must be strictly positive and finite.
    #[error("Invalid domain extent {name}={value} (must be positive and finite)")]
    InvalidExtent { name: &'static str, value: f64 },
    /// Convergence tolerance must be non-negative and finite.
    #[error("Invalid tolerance eps={0} (must be >= 0 and finite)")]
    InvalidTolerance(f64),
    /// A topology needs at least one process.
    #[error("Process topology needs at least one rank")]
    NoRanks,
    /// More ranks than interior rows: some rank would own zero rows.
    #[error("Cannot split {rows} interior rows across {ranks} ranks without leaving a rank empty")]
    TooManyRanks { ranks: usize, rows: usize },
    /// Rank or coordinate outside `0..size`.
    #[error("Rank {rank} is outside a topology of size {size}")]
    RankOutOfRange { rank: usize, size: usize },
    /// Building the Cartesian communicator failed.
    #[error("Topology construction failed: {0}")]
    TopologyCreation(String),
    /// Slab storage could not be allocated.
    #[error("Failed to allocate {len} values for a field slab")]
    Allocation { len: usize },
    /// Grid coordinate not held by this rank's slab.
    #[error("Point (i={i}, j={j}) is not held by this slab (rows {first}..={last}, Nx={nx})")]
    PointOutOfSlab {
        i: usize,
        j: usize,
        first: usize,
        last: usize,
        nx: usize,
    },
    /// Two slabs that must share a layout do not.
    #[error("Slab layout mismatch: expected {expected:?}, found {found:?}")]
    SlabMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    /// The row partition has a gap, an overlap, or an empty range.
    #[error("Row partition invariant violated: {0}")]
    PartitionInvariant(String),
    /// Point-to-point communication with a neighbour failed.
    #[error("Communication error with neighbor {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Writing the solution file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
