//! Output of solver results.

pub mod solution;

pub use solution::{write_owned_rows, write_solution};
