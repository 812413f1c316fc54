//! Sequential CG over the whole grid in one flat array.
//!
//! Shares no storage code with the slab solver; distributed runs are
//! checked against it.

use super::driver::SolveReport;
use super::state::CgState;
use crate::cg_error::CgError;
use crate::data::grid::{GridSpec, K_SQUARED};

/// Full `(Nx+1) x (Ny+1)` field, row-major with `j` as the slow index.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalField {
    pub nx: usize,
    pub ny: usize,
    pub values: Vec<f64>,
}

impl GlobalField {
    fn zeros(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            values: vec![0.0; (nx + 1) * (ny + 1)],
        }
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        j * (self.nx + 1) + i
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.idx(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        let k = self.idx(i, j);
        self.values[k] = value;
    }
}

fn laplace(spec: &GridSpec, f: &GlobalField, i: usize, j: usize) -> f64 {
    let (hx, hy) = (spec.hx(), spec.hy());
    let c = f.get(i, j);
    (-1.0 / (hx * hx)) * (f.get(i - 1, j) - 2.0 * c + f.get(i + 1, j))
        + (-1.0 / (hy * hy)) * (f.get(i, j - 1) - 2.0 * c + f.get(i, j + 1))
        + K_SQUARED * c
}

fn interior(spec: &GridSpec) -> impl Iterator<Item = (usize, usize)> + 'static {
    let (nx, ny) = (spec.nx, spec.ny);
    (1..ny).flat_map(move |j| (1..nx).map(move |i| (i, j)))
}

fn dot(spec: &GridSpec, a: &GlobalField, b: &GlobalField) -> f64 {
    interior(spec).map(|(i, j)| a.get(i, j) * b.get(i, j)).sum()
}

/// Solve on a single process from the zero initial guess.
pub fn solve_global(
    spec: &GridSpec,
    k_max: usize,
    eps: f64,
) -> Result<(GlobalField, SolveReport), CgError> {
    spec.validate()?;
    if !(eps.is_finite() && eps >= 0.0) {
        return Err(CgError::InvalidTolerance(eps));
    }
    let (nx, ny) = (spec.nx, spec.ny);
    let points = spec.interior_points();
    let scale = 1.0 / (spec.hx().powi(2) * spec.hy().powi(2));

    let mut v = GlobalField::zeros(nx, ny);
    for j in 0..=ny {
        for i in 0..=nx {
            if let Some(b) = spec.boundary_value(i, j) {
                v.set(i, j, b);
            }
        }
    }

    let mut res = GlobalField::zeros(nx, ny);
    for (i, j) in interior(spec) {
        let r = scale * spec.rhs_value(i, j) - laplace(spec, &v, i, j);
        res.set(i, j, r);
    }
    let mut state = CgState::start(dot(spec, &res, &res), points, eps, k_max);
    let initial_residual = state.sum_res;
    let mut history = vec![initial_residual];

    let mut d = res.clone();
    let mut z = GlobalField::zeros(nx, ny);
    while state.status().is_none() {
        for (i, j) in interior(spec) {
            let l = laplace(spec, &d, i, j);
            z.set(i, j, l);
        }
        let Some(alpha) = state.step_length(dot(spec, &d, &z)) else {
            break;
        };
        for (i, j) in interior(spec) {
            let k = v.idx(i, j);
            v.values[k] += alpha * d.values[k];
            res.values[k] -= alpha * z.values[k];
        }
        let next = state.advance(dot(spec, &res, &res));
        history.push(state.sum_res);
        if let Some(beta) = next {
            for (i, j) in interior(spec) {
                let k = d.idx(i, j);
                d.values[k] = res.values[k] + beta * d.values[k];
            }
        }
    }

    let report = SolveReport {
        status: state
            .status()
            .ok_or_else(|| CgError::PartitionInvariant("solve ended without a status".into()))?,
        iterations: state.iteration,
        initial_residual,
        residual: state.sum_res,
        history,
    };
    Ok((v, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::state::SolveStatus;

    #[test]
    fn boundary_rows_are_fixed() {
        let spec = GridSpec::with_extent(4, 4, 1.0, 1.0).unwrap();
        let (v, _) = solve_global(&spec, 20, 1e-3).unwrap();
        for i in 0..=4 {
            assert_eq!(v.get(i, 0), 0.0);
            assert_eq!(Some(v.get(i, 4)), spec.boundary_value(i, 4));
        }
        for j in 0..=4 {
            assert_eq!(v.get(0, j), 0.0);
            assert_eq!(v.get(4, j), 0.0);
        }
    }

    #[test]
    fn converges_on_a_moderate_grid() {
        let spec = GridSpec::with_extent(16, 16, 1.0, 1.0).unwrap();
        let (_, start) = solve_global(&spec, 0, 0.0).unwrap();
        let (_, report) = solve_global(&spec, 500, start.initial_residual * 1e-8).unwrap();
        assert_eq!(report.status, SolveStatus::Converged);
        assert!(report.residual < report.initial_residual);
    }

    #[test]
    fn zero_cap_returns_initial_guess() {
        let spec = GridSpec::with_extent(8, 8, 1.0, 1.0).unwrap();
        let (v, report) = solve_global(&spec, 0, 0.0).unwrap();
        assert_eq!(report.status, SolveStatus::MaxItersReached);
        assert_eq!(report.iterations, 0);
        assert_eq!(v.get(3, 3), 0.0);
    }
}
