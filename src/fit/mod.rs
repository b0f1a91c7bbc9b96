//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - resolve the growth model from the dataset name (`selection`)
//! - fit it, falling back to a quadratic on solver failure (`fitter`)
//! - assemble the cross-dataset comparison (`aggregate`)

pub mod aggregate;
pub mod fitter;
pub mod selection;

pub use aggregate::*;
pub use fitter::*;
pub use selection::*;
