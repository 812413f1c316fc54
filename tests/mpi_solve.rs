#![cfg(feature = "mpi-support")]
//! Runs on however many processes `mpirun` starts (one under plain
//! `cargo test`). MPI can only be initialised once per process, so
//! everything lives in a single test.

use halo_cg::prelude::*;
use halo_cg::solver::reference::solve_global;

#[test]
fn mpi_solve_matches_reference() {
    let comm = MpiComm::new().expect("MPI init");
    let size = comm.size();
    let spec = GridSpec::with_extent(8, 4 * size + 1, 1.0, 1.0).unwrap();

    let topo = comm.topology(spec.ny).unwrap();
    assert_eq!(topo.size, size);
    assert_eq!(topo.rows.len(), 4);
    assert_eq!(topo.up.is_none(), topo.coord == 0);
    assert_eq!(topo.down.is_none(), topo.coord + 1 == size);

    let total = comm.all_reduce_sum(1.0);
    assert_eq!(total, size as f64);

    let (_, start) = solve_global(&spec, 0, 0.0).unwrap();
    let eps = start.initial_residual * 1e-12;
    let (want, _) = solve_global(&spec, 500, eps).unwrap();

    let halo = MpiHalo::new(&comm, topo, spec.nx);
    let mut solver = CgSolver::new(spec, topo, &comm, halo).unwrap();
    let report = solver.solve(500, eps).unwrap();
    assert!(report.converged(), "{report:?}");

    let scale = want.values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    for j in topo.rows.iter() {
        for i in 0..=spec.nx {
            let diff = (solver.grid().get(i, j) - want.get(i, j)).abs();
            assert!(diff <= 1e-7 * scale, "({i},{j}) off by {diff}");
        }
    }
    comm.barrier();
}
