//! Distributed CG driver.
//!
//! One [`CgSolver`] lives on every rank. All slabs are allocated in
//! [`CgSolver::new`]; `solve` only mutates them in place.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::state::{CgPhase, CgState, SolveStatus};
use crate::algs::communicator::Collectives;
use crate::algs::halo::{DIRECTION_TAGS, HaloExchange, SOLUTION_TAGS};
use crate::algs::reduction::{global_dot, global_norm_sq};
use crate::algs::stencil::Stencil;
use crate::cg_error::CgError;
use crate::data::grid::{Grid, GridSpec};
use crate::data::slab::Slab;
use crate::timing::{NoopObserver, Phase, PhaseObserver, timed};
use crate::topology::ProcessTopology;

/// Outcome of one solve, identical on every rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Completed iterations; an iteration that reaches the tolerance counts.
    pub iterations: usize,
    pub initial_residual: f64,
    /// RMS residual `sqrt(‖res‖² / ((Nx-1)(Ny-1)))` at the end.
    pub residual: f64,
    /// RMS residual after the initial residual and after every iteration.
    pub history: Vec<f64>,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }
}

pub struct CgSolver<'c, C: Collectives + ?Sized, H: HaloExchange> {
    grid: Grid,
    res: Slab,
    dir: Slab,
    img: Slab,
    stencil: Stencil,
    topo: ProcessTopology,
    comm: &'c C,
    halo: H,
    phase: CgPhase,
}

impl<'c, C: Collectives + ?Sized, H: HaloExchange> CgSolver<'c, C, H> {
    /// Allocate this rank's slabs and fill forcing and boundary data.
    pub fn new(
        spec: GridSpec,
        topo: ProcessTopology,
        comm: &'c C,
        halo: H,
    ) -> Result<Self, CgError> {
        if topo.size != comm.size() || topo.rank != comm.rank() {
            return Err(CgError::TopologyCreation(format!(
                "topology describes rank {}/{} but communicator is rank {}/{}",
                topo.rank,
                topo.size,
                comm.rank(),
                comm.size()
            )));
        }
        let grid = Grid::new(spec, topo.rows)?;
        Ok(Self {
            res: Slab::new(spec.nx, topo.rows)?,
            dir: Slab::new(spec.nx, topo.rows)?,
            img: Slab::new(spec.nx, topo.rows)?,
            stencil: Stencil::new(&spec),
            grid,
            topo,
            comm,
            halo,
            phase: CgPhase::Init,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub fn topology(&self) -> &ProcessTopology {
        &self.topo
    }

    pub fn phase(&self) -> CgPhase {
        self.phase
    }

    /// Overwrite the owned interior of `v` with `guess(i, j)`.
    pub fn set_initial_guess(&mut self, guess: impl Fn(usize, usize) -> f64) {
        let v = self.grid.solution_mut();
        for j in v.rows().iter() {
            for (k, u) in v.interior_mut(j).iter_mut().enumerate() {
                *u = guess(k + 1, j);
            }
        }
    }

    pub fn solve(&mut self, k_max: usize, eps: f64) -> Result<SolveReport, CgError> {
        self.solve_observed(k_max, eps, &mut NoopObserver)
    }

    /// Run CG from the current `v`, reporting phases to `obs`.
    pub fn solve_observed<O: PhaseObserver + ?Sized>(
        &mut self,
        k_max: usize,
        eps: f64,
        obs: &mut O,
    ) -> Result<SolveReport, CgError> {
        if !(eps.is_finite() && eps >= 0.0) {
            return Err(CgError::InvalidTolerance(eps));
        }
        let points = self.grid.spec().interior_points();
        let coordinator = self.topo.is_coordinator();

        self.phase = CgPhase::ComputeInitialResidual;
        timed(obs, Phase::HaloExchange, || {
            self.halo.exchange(self.grid.solution_mut(), SOLUTION_TAGS)
        })?;
        timed(obs, Phase::Computation, || {
            self.stencil
                .residual(self.grid.rhs(), self.grid.solution(), &mut self.res)
        })?;
        let delta0 = timed(obs, Phase::Reduction, || {
            global_norm_sq(self.comm, &self.res)
        });

        let mut state = CgState::start(delta0, points, eps, k_max);
        let initial_residual = state.sum_res;
        let mut history = vec![initial_residual];
        self.phase = state.phase();
        if coordinator {
            debug!("initial residual {initial_residual:e}");
        }

        if state.phase() == CgPhase::Iterating {
            self.dir.copy_owned_from(&self.res)?;
        }
        while state.phase() == CgPhase::Iterating {
            timed(obs, Phase::HaloExchange, || {
                self.halo.exchange(&mut self.dir, DIRECTION_TAGS)
            })?;
            timed(obs, Phase::Computation, || {
                self.stencil.apply(&self.dir, &mut self.img)
            })?;
            let curvature = timed(obs, Phase::Reduction, || {
                global_dot(self.comm, &self.dir, &self.img)
            });
            let Some(alpha) = state.step_length(curvature) else {
                if coordinator {
                    warn!(
                        "CG stagnated after {} iterations: d·z = {curvature:e}",
                        state.iteration
                    );
                }
                break;
            };

            timed(obs, Phase::Computation, || {
                self.update_solution_and_residual(alpha)
            });
            let delta1 = timed(obs, Phase::Reduction, || {
                global_norm_sq(self.comm, &self.res)
            });
            let next = state.advance(delta1);
            history.push(state.sum_res);
            if coordinator {
                debug!("iteration {}: residual {:e}", state.iteration, state.sum_res);
            }
            if let Some(beta) = next {
                timed(obs, Phase::Computation, || self.update_direction(beta));
            }
        }
        self.phase = state.phase();

        let status = state.status().unwrap_or(SolveStatus::MaxItersReached);
        let report = SolveReport {
            status,
            iterations: state.iteration,
            initial_residual,
            residual: state.sum_res,
            history,
        };
        if coordinator {
            match status {
                SolveStatus::Converged => info!(
                    "converged in {} iterations, residual norm {:e}",
                    report.iterations, report.residual
                ),
                SolveStatus::MaxItersReached => warn!(
                    "no convergence within {k_max} iterations, residual norm {:e}",
                    report.residual
                ),
                SolveStatus::Stagnated => warn!(
                    "stopped at iteration {} without a usable step, residual norm {:e}",
                    report.iterations, report.residual
                ),
            }
        }
        Ok(report)
    }

    /// `v += alpha·d`, `res -= alpha·z` on owned rows.
    fn update_solution_and_residual(&mut self, alpha: f64) {
        let v = self.grid.solution_mut();
        for j in self.topo.rows.iter() {
            for (u, d) in v.interior_mut(j).iter_mut().zip(self.dir.interior(j)) {
                *u += alpha * d;
            }
            for (r, z) in self.res.interior_mut(j).iter_mut().zip(self.img.interior(j)) {
                *r -= alpha * z;
            }
        }
    }

    /// `d = res + beta·d` on owned rows.
    fn update_direction(&mut self, beta: f64) {
        for j in self.topo.rows.iter() {
            for (d, r) in self.dir.interior_mut(j).iter_mut().zip(self.res.interior(j)) {
                *d = r + beta * *d;
            }
        }
    }
}
