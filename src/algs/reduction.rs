//! Global scalar reductions over distributed slabs.
//!
//! Partial sums cover owned rows and interior columns only. Ghost rows are
//! copies of a neighbour's rows and would be counted twice.

use itertools::izip;

use crate::algs::communicator::Collectives;
use crate::data::slab::Slab;

/// This rank's share of `a · b`.
pub fn local_dot(a: &Slab, b: &Slab) -> f64 {
    debug_assert_eq!(a.layout(), b.layout(), "dot product of unrelated slabs");
    a.rows()
        .iter()
        .map(|j| {
            izip!(a.interior(j), b.interior(j))
                .map(|(x, y)| x * y)
                .sum::<f64>()
        })
        .sum()
}

/// `a · b` over the whole grid; identical on every rank.
pub fn global_dot<C: Collectives + ?Sized>(comm: &C, a: &Slab, b: &Slab) -> f64 {
    comm.all_reduce_sum(local_dot(a, b))
}

/// `‖a‖²` over the whole grid.
pub fn global_norm_sq<C: Collectives + ?Sized>(comm: &C, a: &Slab) -> f64 {
    global_dot(comm, a, a)
}

/// Root-mean-square residual `sqrt(delta / n)` used by the convergence test.
pub fn rms(delta: f64, points: usize) -> f64 {
    (delta / points as f64).sqrt()
}
