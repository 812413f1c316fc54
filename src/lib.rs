//! # halo-cg
//!
//! Distributed conjugate-gradient solver for the five-point discretisation of
//! `-Δu + 4π²u = f` on a rectangle with Dirichlet boundary data.
//!
//! The interior rows of an `Nx x Ny` grid are split across a 1xP chain of
//! ranks. Each rank stores its rows plus one ghost row on each side, refreshes
//! the ghost rows with a halo exchange before every stencil application, and
//! joins a global sum reduction for every inner product.
//!
//! ## Transports
//! - [`NoComm`](algs::communicator::NoComm): a single rank.
//! - [`LocalComm`](algs::communicator::LocalComm): `P` ranks as threads of one
//!   process, see [`run_local`](algs::communicator::run_local).
//! - `MpiComm` (feature `mpi-support`): one MPI process per rank on a
//!   Cartesian communicator.
//!
//! ## Usage
//! ```no_run
//! use halo_cg::prelude::*;
//!
//! let spec = GridSpec::with_extent(64, 64, 1.0, 1.0)?;
//! let reports = run_local(4, |comm| {
//!     let topo = ProcessTopology::linear(comm.rank(), comm.size(), spec.ny)?;
//!     let halo = CommHalo::new(&comm, topo);
//!     CgSolver::new(spec, topo, &comm, halo)?.solve(500, 1e-8)
//! });
//! for r in reports {
//!     println!("{:?}", r?.status);
//! }
//! # Ok::<(), halo_cg::cg_error::CgError>(())
//! ```

pub mod algs;
pub mod cg_error;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod solver;
pub mod timing;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// The most-used types and traits.
pub mod prelude {
    pub use crate::algs::communicator::{Collectives, Communicator, LocalComm, NoComm, run_local};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::halo::{CommHalo, HaloExchange};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::halo::MpiHalo;
    pub use crate::cg_error::CgError;
    pub use crate::config::{Cli, SolverConfig};
    pub use crate::data::grid::{Grid, GridSpec};
    pub use crate::data::slab::Slab;
    pub use crate::solver::{CgSolver, RankOutcome, SolveReport, SolveStatus, run_rank};
    pub use crate::timing::{Phase, PhaseObserver, PhaseTimer};
    pub use crate::topology::{ProcessTopology, RowPartition, RowRange};
}
