#![allow(dead_code)]
use halo_cg::prelude::*;
use halo_cg::solver::reference::GlobalField;

/// Solve on `ranks` in-process ranks from the zero guess.
pub fn solve_local(spec: GridSpec, ranks: usize, k_max: usize, eps: f64) -> Vec<RankOutcome> {
    let config = SolverConfig::new(spec, k_max, eps).with_ranks(ranks);
    run_local(ranks, |comm| {
        let topo = ProcessTopology::linear(comm.rank(), comm.size(), spec.ny).unwrap();
        let halo = CommHalo::new(&comm, topo);
        run_rank(&comm, topo, halo, &config, &mut PhaseTimer::new()).unwrap()
    })
}

/// Assemble the full `(Nx+1) x (Ny+1)` field from every rank's owned rows
/// and the Dirichlet rows `0` and `Ny`.
pub fn gather(spec: &GridSpec, outcomes: &[RankOutcome]) -> GlobalField {
    let (nx, ny) = (spec.nx, spec.ny);
    let mut values = vec![0.0; (nx + 1) * (ny + 1)];
    for j in [0, ny] {
        for i in 0..=nx {
            values[j * (nx + 1) + i] = spec.boundary_value(i, j).unwrap();
        }
    }
    for o in outcomes {
        for j in o.grid.rows().iter() {
            for i in 0..=nx {
                values[j * (nx + 1) + i] = o.grid.get(i, j);
            }
        }
    }
    GlobalField { nx, ny, values }
}

/// Largest pointwise difference relative to the largest magnitude in `want`.
pub fn max_rel_diff(got: &GlobalField, want: &GlobalField) -> f64 {
    let scale = want
        .values
        .iter()
        .fold(0.0f64, |m, v| m.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    got.values
        .iter()
        .zip(&want.values)
        .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()))
        / scale
}

/// Unit-extent grid; `sin(2π·hx·i)` does not vanish on its columns.
pub fn unit_grid(nx: usize, ny: usize) -> GridSpec {
    GridSpec::with_extent(nx, ny, 1.0, 1.0).unwrap()
}
