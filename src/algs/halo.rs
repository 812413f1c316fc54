//! Ghost-row exchange between row neighbours.
//!
//! Every rank sends its first owned row to `up` and its last owned row to
//! `down`, and receives the neighbours' rows into its two ghost rows. Only
//! the interior columns `1..Nx` travel; boundary columns are globally fixed.
//!
//! Rows moving towards lower coordinates carry [`HaloTags::to_up`], rows
//! moving towards higher coordinates [`HaloTags::to_down`], so a rank's
//! receive from one side can never be satisfied by a send meant for the
//! other. Each field gets its own tag pair.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, decode_row_into};
use crate::cg_error::CgError;
use crate::data::slab::{GhostSide, Slab};
use crate::topology::ProcessTopology;

/// Tag pair of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HaloTags {
    pub to_up: CommTag,
    pub to_down: CommTag,
}

impl HaloTags {
    pub const fn for_field(base: CommTag) -> Self {
        Self {
            to_up: base,
            to_down: base.offset(1),
        }
    }

    /// Tag of the row this rank sends across `side`.
    pub const fn outgoing(&self, side: GhostSide) -> CommTag {
        match side {
            GhostSide::Lower => self.to_up,
            GhostSide::Upper => self.to_down,
        }
    }

    /// Tag of the row this rank receives into the ghost row on `side`.
    pub const fn incoming(&self, side: GhostSide) -> CommTag {
        match side {
            GhostSide::Lower => self.to_down,
            GhostSide::Upper => self.to_up,
        }
    }
}

/// Tags of the solution field `v`.
pub const SOLUTION_TAGS: HaloTags = HaloTags::for_field(CommTag::new(0x10));
/// Tags of the search direction `d`.
pub const DIRECTION_TAGS: HaloTags = HaloTags::for_field(CommTag::new(0x20));

/// Refresh both ghost rows of `field` from the row neighbours.
///
/// Returns once all sends and receives of the call have completed. Ghost
/// rows facing a missing neighbour are left untouched.
pub trait HaloExchange {
    fn exchange(&mut self, field: &mut Slab, tags: HaloTags) -> Result<(), CgError>;
}

fn neighbour(topo: &ProcessTopology, side: GhostSide) -> Option<usize> {
    match side {
        GhostSide::Lower => topo.up,
        GhostSide::Upper => topo.down,
    }
}

/// Halo exchange over any point-to-point [`Communicator`].
///
/// Received rows arrive through [`Wait::wait`] and are decoded straight into
/// the ghost rows, so no receive buffer is posted.
pub struct CommHalo<'c, C: Communicator> {
    comm: &'c C,
    topo: ProcessTopology,
}

impl<'c, C: Communicator> CommHalo<'c, C> {
    pub fn new(comm: &'c C, topo: ProcessTopology) -> Self {
        Self { comm, topo }
    }
}

impl<C: Communicator> HaloExchange for CommHalo<'_, C> {
    fn exchange(&mut self, field: &mut Slab, tags: HaloTags) -> Result<(), CgError> {
        // 1) post receives
        let mut pending_recvs = Vec::with_capacity(2);
        for side in GhostSide::BOTH {
            if let Some(nbr) = neighbour(&self.topo, side) {
                let h = self.comm.irecv(nbr, tags.incoming(side).as_u16(), &mut []);
                pending_recvs.push((side, nbr, h));
            }
        }

        // 2) post sends of the owned edge rows
        let mut pending_sends = Vec::with_capacity(2);
        for side in GhostSide::BOTH {
            if let Some(nbr) = neighbour(&self.topo, side) {
                let row = field.interior(field.edge_row(side));
                pending_sends.push(self.comm.isend(nbr, tags.outgoing(side).as_u16(), cast_slice(row)));
            }
        }

        // 3) wait for every receive, keep the first error but drain the rest
        let mut maybe_err = None;
        for (side, nbr, h) in pending_recvs {
            let ghost = field.ghost_row(side);
            let result = match h.wait() {
                Some(raw) => decode_row_into(&raw, field.interior_mut(ghost)),
                None => Err(format!("no row received from rank {nbr}")),
            };
            if let Err(msg) = result {
                if maybe_err.is_none() {
                    maybe_err = Some(CgError::CommError {
                        neighbor: nbr,
                        source: msg.into(),
                    });
                }
            }
        }

        // 4) always drain send handles before returning
        for send in pending_sends {
            let _ = send.wait();
        }

        match maybe_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "mpi-support")]
mod mpi_halo {
    use super::{HaloExchange, HaloTags, neighbour};
    use crate::algs::communicator::MpiComm;
    use crate::cg_error::CgError;
    use crate::data::slab::{GhostSide, Slab};
    use crate::topology::ProcessTopology;
    use mpi::traits::*;

    /// Halo exchange with MPI immediate sends/receives and a wait on all four.
    ///
    /// Send and receive rows are staged in buffers allocated once, so request
    /// buffers keep the same addresses for the whole solve.
    pub struct MpiHalo<'c> {
        comm: &'c MpiComm,
        topo: ProcessTopology,
        send: [Vec<f64>; 2],
        recv: [Vec<f64>; 2],
    }

    impl<'c> MpiHalo<'c> {
        pub fn new(comm: &'c MpiComm, topo: ProcessTopology, nx: usize) -> Self {
            let n = nx.saturating_sub(1);
            Self {
                comm,
                topo,
                send: [vec![0.0; n], vec![0.0; n]],
                recv: [vec![0.0; n], vec![0.0; n]],
            }
        }
    }

    impl HaloExchange for MpiHalo<'_> {
        fn exchange(&mut self, field: &mut Slab, tags: HaloTags) -> Result<(), CgError> {
            for (side, buf) in GhostSide::BOTH.into_iter().zip(self.send.iter_mut()) {
                if neighbour(&self.topo, side).is_some() {
                    buf.copy_from_slice(field.interior(field.edge_row(side)));
                }
            }
            let cart = &self.comm.cart;
            let (up, down) = (self.topo.up, self.topo.down);
            let [send_lo, send_hi] = &self.send;
            let [recv_lo, recv_hi] = &mut self.recv;
            let tag = |t: crate::algs::communicator::CommTag| i32::from(t.as_u16());

            mpi::request::scope(|scope| {
                let r_lo = match up {
                    Some(p) => Some(cart.process_at_rank(p as i32).immediate_receive_into_with_tag(
                        scope,
                        &mut recv_lo[..],
                        tag(tags.incoming(GhostSide::Lower)),
                    )),
                    None => None,
                };
                let r_hi = match down {
                    Some(p) => Some(cart.process_at_rank(p as i32).immediate_receive_into_with_tag(
                        scope,
                        &mut recv_hi[..],
                        tag(tags.incoming(GhostSide::Upper)),
                    )),
                    None => None,
                };
                let s_lo = up.map(|p| {
                    cart.process_at_rank(p as i32).immediate_send_with_tag(
                        scope,
                        &send_lo[..],
                        tag(tags.outgoing(GhostSide::Lower)),
                    )
                });
                let s_hi = down.map(|p| {
                    cart.process_at_rank(p as i32).immediate_send_with_tag(
                        scope,
                        &send_hi[..],
                        tag(tags.outgoing(GhostSide::Upper)),
                    )
                });
                if let Some(r) = r_lo {
                    r.wait();
                }
                if let Some(r) = r_hi {
                    r.wait();
                }
                if let Some(s) = s_lo {
                    s.wait();
                }
                if let Some(s) = s_hi {
                    s.wait();
                }
            });

            for (side, buf) in GhostSide::BOTH.into_iter().zip(self.recv.iter()) {
                if neighbour(&self.topo, side).is_some() {
                    let ghost = field.ghost_row(side);
                    field.interior_mut(ghost).copy_from_slice(buf);
                }
            }
            Ok(())
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_halo::MpiHalo;
