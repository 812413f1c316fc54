//! Data module: field slabs and the model-problem grid

pub mod grid;
pub mod slab;

pub use grid::{Grid, GridSpec, K_SQUARED};
pub use slab::{GhostSide, Slab};
