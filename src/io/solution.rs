//! Plain-text dump of the distributed solution.
//!
//! One `x y u(x,y)` line per grid point and a blank line after every grid
//! row. Ranks append to the same file one coordinate at a time, separated by
//! barriers; the coordinator writes the header and the boundary rows `0`
//! and `Ny` from the Dirichlet data.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::algs::communicator::Collectives;
use crate::cg_error::CgError;
use crate::data::grid::{Grid, GridSpec};
use crate::topology::ProcessTopology;

pub const HEADER: &str = "# x y u(x,y)";

/// Write grid row `j` using `value(i)` for the column values.
pub fn write_row<W: Write>(
    out: &mut W,
    spec: &GridSpec,
    j: usize,
    value: impl Fn(usize) -> f64,
) -> std::io::Result<()> {
    let y = spec.y(j);
    for i in 0..=spec.nx {
        writeln!(out, "{} {} {}", spec.x(i), y, value(i))?;
    }
    writeln!(out)
}

/// Write the boundary row `j` (`0` or `Ny`) from the Dirichlet data.
pub fn write_boundary_row<W: Write>(out: &mut W, spec: &GridSpec, j: usize) -> std::io::Result<()> {
    write_row(out, spec, j, |i| spec.boundary_value(i, j).unwrap_or(0.0))
}

/// Write every row this rank owns, in increasing `j`.
pub fn write_owned_rows<W: Write>(out: &mut W, grid: &Grid) -> std::io::Result<()> {
    let spec = grid.spec();
    for j in grid.rows().iter() {
        write_row(out, spec, j, |i| grid.get(i, j))?;
    }
    Ok(())
}

fn append_with<F>(path: &Path, truncate: bool, f: F) -> Result<(), CgError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = if truncate {
        File::create(path)?
    } else {
        OpenOptions::new().append(true).create(true).open(path)?
    };
    let mut out = BufWriter::new(file);
    f(&mut out)?;
    out.flush()?;
    Ok(())
}

/// Collective: every rank of `comm` must call this with its own grid.
///
/// Ranks stay in barrier lockstep even after a local I/O failure; the
/// first failure of this rank is returned once all ranks are done.
pub fn write_solution<C: Collectives + ?Sized>(
    comm: &C,
    topo: &ProcessTopology,
    grid: &Grid,
    path: &Path,
) -> Result<(), CgError> {
    let spec = grid.spec();
    let mut first_err = None;
    let mut keep = |r: Result<(), CgError>| {
        if let Err(e) = r {
            first_err.get_or_insert(e);
        }
    };

    if topo.is_coordinator() {
        debug!("writing solution to {}", path.display());
        keep(append_with(path, true, |out| {
            writeln!(out, "{HEADER}")?;
            write_boundary_row(out, spec, 0)
        }));
    }
    for coord in 0..topo.size {
        comm.barrier();
        if topo.coord == coord {
            keep(append_with(path, false, |out| write_owned_rows(out, grid)));
        }
    }
    comm.barrier();
    if topo.is_coordinator() {
        keep(append_with(path, false, |out| {
            write_boundary_row(out, spec, spec.ny)
        }));
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
