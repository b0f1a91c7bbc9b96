//! Input/output helpers.
//!
//! - dataset discovery + CSV ingest/validation (`ingest`)
//! - fit summary exports (JSON/CSV) and dataset CSV writing (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
