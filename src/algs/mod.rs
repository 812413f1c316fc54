//! Communication and numerical kernels used by the solver.

pub mod communicator;
pub mod halo;
pub mod reduction;
pub mod stencil;
pub mod wire;

pub use communicator::{Collectives, Communicator, NoComm};
pub use halo::{CommHalo, HaloExchange};
