use std::path::PathBuf;

use halo_cg::io::solution::HEADER;
use halo_cg::prelude::*;

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("halo-cg-{}-{name}.txt", std::process::id()))
}

fn parse_points(text: &str) -> Vec<(f64, f64, f64)> {
    text.lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| {
            let v: Vec<f64> = l.split(' ').map(|t| t.parse().unwrap()).collect();
            (v[0], v[1], v[2])
        })
        .collect()
}

fn write_with_ranks(ranks: usize, name: &str) -> (GridSpec, String, Vec<RankOutcome>) {
    let spec = GridSpec::with_extent(5, 7, 1.0, 1.0).unwrap();
    let path = scratch_file(name);
    let config = SolverConfig::new(spec, 4, 0.0)
        .with_ranks(ranks)
        .with_output(&path);
    let outcomes = run_local(ranks, |comm| {
        let topo = ProcessTopology::linear(comm.rank(), comm.size(), spec.ny).unwrap();
        let halo = CommHalo::new(&comm, topo);
        run_rank(&comm, topo, halo, &config, &mut PhaseTimer::new()).unwrap()
    });
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    (spec, text, outcomes)
}

#[test]
fn file_lists_every_grid_point_in_row_order() {
    let (spec, text, outcomes) = write_with_ranks(3, "order");
    assert_eq!(text.lines().next(), Some(HEADER));

    let points = parse_points(&text);
    assert_eq!(points.len(), (spec.nx + 1) * (spec.ny + 1));
    for (k, &(x, y, _)) in points.iter().enumerate() {
        let (i, j) = (k % (spec.nx + 1), k / (spec.nx + 1));
        assert_eq!((x, y), (spec.x(i), spec.y(j)), "point {k}");
    }

    // one blank line after each of the Ny + 1 rows
    assert_eq!(text.matches("\n\n").count(), spec.ny + 1);

    for o in &outcomes {
        for j in o.grid.rows().iter() {
            for i in 0..=spec.nx {
                assert_eq!(points[j * (spec.nx + 1) + i].2, o.grid.get(i, j));
            }
        }
    }
}

#[test]
fn boundary_rows_come_from_dirichlet_data() {
    let (spec, text, _) = write_with_ranks(2, "boundary");
    let points = parse_points(&text);
    for i in 0..=spec.nx {
        assert_eq!(points[i].2, 0.0);
        let top = points[spec.ny * (spec.nx + 1) + i].2;
        assert_eq!(Some(top), spec.boundary_value(i, spec.ny));
    }
}

#[test]
fn rank_count_does_not_change_the_layout() {
    let (_, one, _) = write_with_ranks(1, "one");
    let (_, three, _) = write_with_ranks(3, "three");
    let a = parse_points(&one);
    let b = parse_points(&three);
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(&b) {
        assert_eq!((p.0, p.1), (q.0, q.1));
        assert!((p.2 - q.2).abs() <= 1e-9 * p.2.abs().max(1.0));
    }
}

#[test]
fn unwritable_path_is_an_io_error() {
    let spec = GridSpec::with_extent(4, 4, 1.0, 1.0).unwrap();
    let topo = ProcessTopology::linear(0, 1, spec.ny).unwrap();
    let grid = Grid::new(spec, topo.rows).unwrap();
    let path = std::env::temp_dir().join("halo-cg-missing-dir").join("nested").join("u.txt");
    let err = halo_cg::io::write_solution(&NoComm, &topo, &grid, &path).unwrap_err();
    assert!(matches!(err, CgError::Io(_)));
}
