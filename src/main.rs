//! `halo-cg <Nx> <Ny> <k_max> <eps>`: solve on `--ranks` threads, or on the
//! MPI world when built with `mpi-support`.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::error;

use halo_cg::prelude::*;
use halo_cg::timing::timed;

fn print_summary(config: &SolverConfig, outcome: &RankOutcome, timer: &PhaseTimer, secs: f64) {
    let g = &config.grid;
    println!("[INFO] N: [{}, {}], NP: {}", g.nx, g.ny, outcome.topology.size);
    println!("[INFO] Iteration number: {}", outcome.report.iterations);
    println!("[INFO] Residual norm: {:e}", outcome.report.residual);
    println!("[INFO] Status: {:?}", outcome.report.status);
    println!("[INFO] Sys time: {secs:.6}");
    if config.timings {
        println!("{}", timer.summary());
    }
}

#[cfg(not(feature = "mpi-support"))]
fn solve_rank<C: Communicator>(
    comm: &C,
    config: &SolverConfig,
    timer: &mut PhaseTimer,
) -> Result<RankOutcome, CgError> {
    let topo = timed(timer, Phase::Topology, || {
        ProcessTopology::linear(comm.rank(), comm.size(), config.grid.ny)
    })?;
    let halo = CommHalo::new(comm, topo);
    run_rank(comm, topo, halo, config, timer)
}

#[cfg(not(feature = "mpi-support"))]
fn run(config: &SolverConfig) -> ExitCode {
    let start = Instant::now();
    let results = run_local(config.ranks, |comm| {
        let mut timer = PhaseTimer::new();
        solve_rank(&comm, config, &mut timer)
            .inspect_err(|_| comm.abort())
            .map(|o| (o, timer))
    });
    let secs = start.elapsed().as_secs_f64();

    let mut code = ExitCode::SUCCESS;
    for (rank, result) in results.iter().enumerate() {
        match result {
            Ok((outcome, timer)) if rank == 0 => print_summary(config, outcome, timer, secs),
            Ok(_) => {}
            Err(e) => {
                error!("rank {rank}: {e}");
                code = ExitCode::FAILURE;
            }
        }
    }
    code
}

#[cfg(feature = "mpi-support")]
fn run(config: &SolverConfig) -> ExitCode {
    let start = Instant::now();
    let mut timer = PhaseTimer::new();
    let comm = match MpiComm::new() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let result = config
        .validate_ranks(comm.size())
        .and_then(|()| timed(&mut timer, Phase::Topology, || comm.topology(config.grid.ny)))
        .and_then(|topo| {
            let halo = MpiHalo::new(&comm, topo, config.grid.nx);
            run_rank(&comm, topo, halo, config, &mut timer)
        });
    match result {
        Ok(outcome) => {
            if outcome.topology.is_coordinator() {
                print_summary(config, &outcome, &timer, start.elapsed().as_secs_f64());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("rank {}: {e}", comm.rank());
            comm.abort(1)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let config = match SolverConfig::try_from(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("halo-cg: {e}");
            return ExitCode::FAILURE;
        }
    };
    run(&config)
}
