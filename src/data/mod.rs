//! Synthetic benchmark data.

pub mod sample;

pub use sample::*;
