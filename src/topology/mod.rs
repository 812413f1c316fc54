//! Process topology and row partitioning.
//!
//! This module holds the communication-free half of the topology builder:
//! - [`partition`]: the deterministic split of interior rows over ranks
//! - [`process`]: a rank's coordinate, neighbours and owned rows
//!
//! The Cartesian communicator itself is created by the transport (see
//! [`crate::algs::communicator`]), which then calls into these helpers.

pub mod partition;
pub mod process;

pub use partition::{RowPartition, RowRange, row_range};
pub use process::ProcessTopology;
