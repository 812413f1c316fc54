//! Five-point discretisation of `-Δ + k²`.
//!
//! ```text
//! L(i,j) = (-1/hx²)(f(i-1,j) - 2f(i,j) + f(i+1,j))
//!        + (-1/hy²)(f(i,j-1) - 2f(i,j) + f(i,j+1))
//!        + k²·f(i,j)
//! ```
//!
//! Evaluated on owned rows and columns `1..Nx`; ghost rows of the input must
//! be current. Boundary columns of the output are never written.

use itertools::izip;

use crate::cg_error::CgError;
use crate::data::grid::{GridSpec, K_SQUARED};
use crate::data::slab::Slab;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    /// `-1/hx²`
    cx: f64,
    /// `-1/hy²`
    cy: f64,
    k2: f64,
    /// `1/(hx²·hy²)`, undoes the `hx²·hy²` folded into the forcing term.
    rhs_scale: f64,
}

impl Stencil {
    pub fn new(spec: &GridSpec) -> Self {
        let hx2 = spec.hx() * spec.hx();
        let hy2 = spec.hy() * spec.hy();
        Self {
            cx: -1.0 / hx2,
            cy: -1.0 / hy2,
            k2: K_SQUARED,
            rhs_scale: (-1.0 / hx2) * (-1.0 / hy2),
        }
    }

    #[inline(always)]
    fn at(&self, below: &[f64], here: &[f64], above: &[f64], i: usize) -> f64 {
        let c = here[i];
        self.cx * (here[i - 1] - 2.0 * c + here[i + 1])
            + self.cy * (below[i] - 2.0 * c + above[i])
            + self.k2 * c
    }

    /// `out = L(f)` on the owned interior of `f`.
    pub fn apply(&self, f: &Slab, out: &mut Slab) -> Result<(), CgError> {
        f.ensure_same_layout(out)?;
        let nx = f.nx();
        for j in f.rows().iter() {
            let (below, here, above) = (f.row(j - 1), f.row(j), f.row(j + 1));
            let dst = out.row_mut(j);
            for i in 1..nx {
                dst[i] = self.at(below, here, above, i);
            }
        }
        Ok(())
    }

    /// `res = rhs/(hx²·hy²) - L(v)` on the owned interior.
    pub fn residual(&self, rhs: &Slab, v: &Slab, res: &mut Slab) -> Result<(), CgError> {
        v.ensure_same_layout(rhs)?;
        v.ensure_same_layout(res)?;
        let nx = v.nx();
        for j in v.rows().iter() {
            let (below, here, above) = (v.row(j - 1), v.row(j), v.row(j + 1));
            let f = rhs.row(j);
            let dst = res.row_mut(j);
            for (i, (r, &fi)) in izip!(&mut dst[1..nx], &f[1..nx]).enumerate() {
                *r = self.rhs_scale * fi - self.at(below, here, above, i + 1);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::RowRange;

    fn spec() -> GridSpec {
        GridSpec::with_extent(4, 4, 1.0, 1.0).unwrap()
    }

    fn slab() -> Slab {
        Slab::new(4, RowRange::new(1, 3).unwrap()).unwrap()
    }

    #[test]
    fn constant_field_only_feels_k_squared_inside() {
        let st = Stencil::new(&spec());
        let mut f = slab();
        for j in 0..=4 {
            f.row_mut(j).fill(1.0);
        }
        let mut out = slab();
        st.apply(&f, &mut out).unwrap();
        for j in 1..=3 {
            for i in 1..4 {
                assert!((out.get(i, j) - K_SQUARED).abs() < 1e-12);
            }
            assert_eq!(out.get(0, j), 0.0);
            assert_eq!(out.get(4, j), 0.0);
        }
    }

    #[test]
    fn point_source_spreads_to_four_neighbours() {
        let st = Stencil::new(&spec());
        let mut f = slab();
        f.set(2, 2, 1.0);
        let mut out = slab();
        st.apply(&f, &mut out).unwrap();
        // h = 1/4: centre 2/h² + 2/h² + k², neighbours -1/h²
        assert!((out.get(2, 2) - (64.0 + K_SQUARED)).abs() < 1e-9);
        for (i, j) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert!((out.get(i, j) + 16.0).abs() < 1e-12, "({i},{j})");
        }
        assert_eq!(out.get(1, 1), 0.0);
    }

    #[test]
    fn ghost_rows_feed_the_edge_rows() {
        let st = Stencil::new(&spec());
        let mut f = slab();
        f.set(2, 4, 1.0); // upper ghost
        let mut out = slab();
        st.apply(&f, &mut out).unwrap();
        assert!((out.get(2, 3) + 16.0).abs() < 1e-12);
        assert_eq!(out.get(2, 2), 0.0);
    }

    #[test]
    fn residual_of_zero_guess_is_scaled_rhs() {
        let s = spec();
        let st = Stencil::new(&s);
        let mut rhs = slab();
        rhs.set(1, 1, 2.0);
        let v = slab();
        let mut res = slab();
        st.residual(&rhs, &v, &mut res).unwrap();
        let scale = 1.0 / (s.hx().powi(2) * s.hy().powi(2));
        assert!((res.get(1, 1) - 2.0 * scale).abs() < 1e-9);
        assert_eq!(res.get(2, 2), 0.0);
    }

    #[test]
    fn mismatched_slabs_are_rejected() {
        let st = Stencil::new(&spec());
        let f = slab();
        let mut out = Slab::new(4, RowRange::new(1, 2).unwrap()).unwrap();
        assert!(matches!(
            st.apply(&f, &mut out),
            Err(CgError::SlabMismatch { .. })
        ));
    }
}
