//! Model selection by dataset identity.
//!
//! The benchmark file name says which algorithm produced the timings, and the
//! algorithm says which growth law to expect. The mapping lives in one table so
//! adding a model is a one-line change and dispatch can be tested on its own.
//!
//! Matching is exact after lower-casing the name, so `Divide_And_Conquer`
//! resolves like `divide_and_conquer`. Unknown names get the quadratic
//! polynomial directly (no nonlinear attempt).

use crate::domain::GrowthModel;

/// Dataset name (lower-case) → growth model.
pub const MODEL_TABLE: &[(&str, GrowthModel)] = &[
    ("divide_and_conquer", GrowthModel::NLogNSquared),
    ("divide_and_conquer_improved", GrowthModel::NLogN),
];

/// Resolve the growth model for a dataset name.
pub fn resolve_model(dataset_name: &str) -> GrowthModel {
    let key = dataset_name.to_lowercase();
    MODEL_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, model)| model)
        .unwrap_or(GrowthModel::Polynomial)
}
