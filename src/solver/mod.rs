//! Conjugate-gradient solver.
//!
//! [`CgSolver`] runs the distributed iteration over one rank's slabs,
//! [`state::CgState`] holds the scalar recurrences, and
//! [`reference::solve_global`] is an independent single-process solve.

pub mod driver;
pub mod reference;
pub mod state;

pub use driver::{CgSolver, SolveReport};
pub use state::{CgPhase, CgState, SolveStatus};

use crate::algs::communicator::Collectives;
use crate::algs::halo::HaloExchange;
use crate::cg_error::CgError;
use crate::config::SolverConfig;
use crate::data::grid::Grid;
use crate::io::write_solution;
use crate::timing::{Phase, PhaseObserver, timed};
use crate::topology::ProcessTopology;

/// What one rank ends up with after [`run_rank`].
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub topology: ProcessTopology,
    pub report: SolveReport,
    pub grid: Grid,
}

/// Solve from the zero guess on this rank and write the solution file if
/// one is configured. Collective over `comm`.
pub fn run_rank<C, H, O>(
    comm: &C,
    topo: ProcessTopology,
    halo: H,
    config: &SolverConfig,
    obs: &mut O,
) -> Result<RankOutcome, CgError>
where
    C: Collectives + ?Sized,
    H: HaloExchange,
    O: PhaseObserver + ?Sized,
{
    let mut solver = CgSolver::new(config.grid, topo, comm, halo)?;
    let report = solver.solve_observed(config.k_max, config.eps, obs)?;
    let grid = solver.into_grid();
    if let Some(path) = &config.output {
        timed(obs, Phase::Output, || write_solution(comm, &topo, &grid, path))?;
    }
    Ok(RankOutcome {
        topology: topo,
        report,
        grid,
    })
}
