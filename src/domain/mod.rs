//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - benchmark inputs (`BenchSample`, `Dataset`)
//! - model dispatch (`GrowthModel`) and fitted curves (`CurveKind`, `FitCurve`)
//! - fit outputs (`FitResult`, `FitOutcome`, `FitQuality`)
//! - run configuration (`AnalyzeConfig`, `GenerateConfig`)

pub mod types;

pub use types::*;
