//! Mathematical utilities: least squares (linear and Levenberg–Marquardt) and grids.

pub mod grid;
pub mod lm;
pub mod ols;

pub use grid::*;
pub use lm::*;
pub use ols::*;
