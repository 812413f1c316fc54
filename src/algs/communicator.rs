//! Thin façade over in-process or inter-process (MPI) message passing.
//!
//! Two capabilities are separated:
//! - [`Collectives`]: rank/size, sum all-reduce and barrier. Every transport
//!   provides these and the CG driver depends on nothing else.
//! - [`Communicator`]: non-blocking point-to-point byte messages. Handles are
//!   **waitable**; the halo exchange calls `.wait()` before it trusts a
//!   received row.
//!
//! The MPI backend (feature `mpi-support`) only implements [`Collectives`];
//! its halo rows move through scoped MPI requests in
//! [`crate::algs::halo::MpiHalo`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

/// Message tag. Each field owns a pair of tags, one per travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    #[inline]
    pub const fn offset(self, by: u16) -> Self {
        Self(self.0.wrapping_add(by))
    }
}

/// Collective operations shared by all ranks of a topology.
pub trait Collectives {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    /// Global sum of `local`; every rank receives the identical total.
    fn all_reduce_sum(&self, local: f64) -> f64;
    /// Block until every rank has entered the barrier.
    fn barrier(&self);
}

/// Non-blocking point-to-point interface.
pub trait Communicator: Collectives {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-rank communicator: reductions are the identity, messaging is a no-op.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Collectives for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn all_reduce_sum(&self, local: f64) -> f64 {
        local
    }
    fn barrier(&self) {}
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- LocalComm: one thread per rank inside a single process ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    queues: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    delivered: Condvar,
}

struct RendezvousState {
    generation: u64,
    arrived: usize,
    slots: Vec<f64>,
    result: f64,
}

/// Reusable generation-counted rendezvous backing all-reduce and barrier.
struct Rendezvous {
    size: usize,
    state: Mutex<RendezvousState>,
    released: Condvar,
}

impl Rendezvous {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(RendezvousState {
                generation: 0,
                arrived: 0,
                slots: vec![0.0; size],
                result: 0.0,
            }),
            released: Condvar::new(),
        }
    }

    /// Contributions are summed in rank order by the last rank to arrive, so
    /// every rank observes the same bits. Returns NaN once `aborted` is set
    /// and the round can no longer complete.
    fn all_reduce_sum(&self, rank: usize, local: f64, aborted: &AtomicBool) -> f64 {
        let mut st = self.state.lock();
        if aborted.load(Ordering::Acquire) {
            return f64::NAN;
        }
        let generation = st.generation;
        st.slots[rank] = local;
        st.arrived += 1;
        if st.arrived == self.size {
            st.result = st.slots.iter().sum();
            st.arrived = 0;
            st.generation = st.generation.wrapping_add(1);
            self.released.notify_all();
            return st.result;
        }
        while st.generation == generation {
            if aborted.load(Ordering::Acquire) {
                return f64::NAN;
            }
            self.released.wait(&mut st);
        }
        st.result
    }
}

/// State shared by every rank of one local universe.
struct Shared {
    mailbox: Mailbox,
    rendezvous: Rendezvous,
    aborted: AtomicBool,
}

impl Shared {
    /// Set the abort flag and wake every rank blocked on a message or a
    /// collective. Each lock is held while notifying.
    fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        {
            let _queues = self.mailbox.queues.lock();
            self.mailbox.delivered.notify_all();
        }
        let _state = self.rendezvous.state.lock();
        self.rendezvous.released.notify_all();
    }
}

/// In-process rank of a [`LocalComm::universe`]; ranks talk through a
/// shared mailbox keyed by `(src, dst, tag)` with FIFO delivery per key.
///
/// After [`LocalComm::abort`], blocked and future receives complete with no
/// data and collectives return NaN.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

impl LocalComm {
    /// `size` connected ranks, in rank order.
    pub fn universe(size: usize) -> Vec<LocalComm> {
        let shared = Arc::new(Shared {
            mailbox: Mailbox::default(),
            rendezvous: Rendezvous::new(size),
            aborted: AtomicBool::new(false),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Give up on the whole universe after a rank-level error.
    pub fn abort(&self) {
        self.shared.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.shared.aborted.load(Ordering::Acquire)
    }
}

/// Aborts the universe if a rank unwinds.
struct AbortOnPanic<'a>(&'a LocalComm);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}

/// Run `f` once per rank of a fresh local universe, one thread each, and
/// collect the results in rank order.
///
/// A panic on any rank aborts the universe and is re-raised on the caller's
/// thread.
pub fn run_local<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(LocalComm) -> T + Sync,
{
    let f = &f;
    std::thread::scope(|scope| {
        let handles: Vec<_> = LocalComm::universe(size)
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let guard_comm = comm.clone();
                    let _guard = AbortOnPanic(&guard_comm);
                    f(comm)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}

pub struct LocalRecvHandle {
    shared: Arc<Shared>,
    key: Key,
}

impl Wait for LocalRecvHandle {
    /// `None` once the universe is aborted and nothing is queued.
    fn wait(self) -> Option<Vec<u8>> {
        let mailbox = &self.shared.mailbox;
        let mut queues = mailbox.queues.lock();
        loop {
            if let Some(bytes) = queues.get_mut(&self.key).and_then(VecDeque::pop_front) {
                return Some(bytes.to_vec());
            }
            if self.shared.aborted.load(Ordering::Acquire) {
                return None;
            }
            mailbox.delivered.wait(&mut queues);
        }
    }
}

impl Collectives for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn all_reduce_sum(&self, local: f64) -> f64 {
        let shared = &self.shared;
        shared.rendezvous.all_reduce_sum(self.rank, local, &shared.aborted)
    }
    fn barrier(&self) {
        self.all_reduce_sum(0.0);
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalRecvHandle;

    /// Buffered: the payload is copied into the mailbox and the send
    /// completes immediately.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.rank, peer, tag);
        let mailbox = &self.shared.mailbox;
        let mut queues = mailbox.queues.lock();
        queues
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        mailbox.delivered.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> LocalRecvHandle {
        LocalRecvHandle {
            shared: Arc::clone(&self.shared),
            key: (peer, self.rank, tag),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Collectives;
    use crate::cg_error::CgError;
    use crate::topology::ProcessTopology;
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::topology::CartesianCommunicator;
    use mpi::traits::*;

    /// Ranks of a non-periodic 1xP Cartesian communicator (reorder allowed).
    pub struct MpiComm {
        pub cart: CartesianCommunicator,
        rank: usize,
        size: usize,
        // declared last: finalizes MPI after `cart` is freed
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, CgError> {
            let universe = mpi::initialize()
                .ok_or_else(|| CgError::TopologyCreation("MPI is already initialized".into()))?;
            let world = universe.world();
            let size = world.size();
            let cart = world
                .create_cartesian_communicator(&[size, 1], &[false, false], true)
                .ok_or_else(|| {
                    CgError::TopologyCreation(format!(
                        "world rank {} is not part of the 1x{size} topology",
                        world.rank()
                    ))
                })?;
            let rank = cart.rank() as usize;
            Ok(Self {
                cart,
                rank,
                size: size as usize,
                _universe: universe,
            })
        }

        /// Coordinate, neighbours (shift by 1 along the partitioned axis)
        /// and owned rows of this rank.
        pub fn topology(&self, ny: usize) -> Result<ProcessTopology, CgError> {
            let coords = self.cart.rank_to_coordinates(self.cart.rank());
            let coord = coords.first().copied().ok_or_else(|| {
                CgError::TopologyCreation("Cartesian communicator has no dimensions".into())
            })? as usize;
            let (up, down) = self.cart.shift(0, 1);
            ProcessTopology::from_shift(
                self.rank,
                self.size,
                coord,
                up.map(|r| r as usize),
                down.map(|r| r as usize),
                ny,
            )
        }

        /// Abort every rank of the communicator.
        pub fn abort(&self, code: i32) -> ! {
            self.cart.abort(code)
        }
    }

    impl Collectives for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
        fn all_reduce_sum(&self, local: f64) -> f64 {
            let mut global = 0.0f64;
            self.cart
                .all_reduce_into(&local, &mut global, SystemOperation::sum());
            global
        }
        fn barrier(&self) {
            self.cart.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
