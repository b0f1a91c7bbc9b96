//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and rendering
//! - exported to JSON/CSV
//! - compared directly in tests (no closures stored anywhere)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of quantile columns (`t_Q0` .. `t_Q4`) in a benchmark row.
pub const QUANTILE_COUNT: usize = 5;

/// One row of benchmark timings for a single input size.
///
/// All times are in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchSample {
    /// Input size.
    pub n: u64,
    pub t_mean: f64,
    pub t_stdev: f64,
    /// Q0 (min), Q1, Q2 (median), Q3, Q4 (max).
    pub quantiles: [f64; QUANTILE_COUNT],
}

/// A validated benchmark dataset for one algorithm/source.
///
/// Construction goes through [`Dataset::new`], which guarantees:
///
/// - at least 2 rows and at least 2 distinct sizes
/// - every size is positive
/// - every timing value is finite and non-negative
/// - rows are ordered by size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    samples: Vec<BenchSample>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, mut samples: Vec<BenchSample>) -> Result<Self, AppError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::new(2, "Dataset name must not be empty."));
        }
        if samples.len() < 2 {
            return Err(AppError::new(
                3,
                format!("Dataset '{name}' needs at least 2 rows, got {}.", samples.len()),
            ));
        }

        for s in &samples {
            if s.n == 0 {
                return Err(AppError::new(2, format!("Dataset '{name}' contains size n=0.")));
            }
            let values = std::iter::once(s.t_mean)
                .chain(std::iter::once(s.t_stdev))
                .chain(s.quantiles.iter().copied());
            for v in values {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(AppError::new(
                        2,
                        format!("Dataset '{name}' has an invalid timing value {v} at n={}.", s.n),
                    ));
                }
            }
        }

        samples.sort_by_key(|s| s.n);
        let distinct = samples.windows(2).filter(|w| w[0].n != w[1].n).count() + 1;
        if distinct < 2 {
            return Err(AppError::new(
                3,
                format!("Dataset '{name}' needs at least 2 distinct sizes, got {distinct}."),
            ));
        }

        Ok(Self { name, samples })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[BenchSample] {
        &self.samples
    }

    /// Sizes as floating point x-values.
    pub fn sizes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.n as f64).collect()
    }

    pub fn mean_times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t_mean).collect()
    }
}

/// Growth model requested for a dataset, resolved once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthModel {
    /// `a·n·log2(n)² + b`
    NLogNSquared,
    /// `a·n·log2(n) + b`
    NLogN,
    /// `a·n² + b·n + c`
    Polynomial,
}

impl GrowthModel {
    /// The curve family fitted first for this model.
    pub fn target_curve(self) -> CurveKind {
        match self {
            GrowthModel::NLogNSquared => CurveKind::NLogNSquared,
            GrowthModel::NLogN => CurveKind::NLogN,
            GrowthModel::Polynomial => CurveKind::Quadratic,
        }
    }

    /// Whether the target curve is fitted with the nonlinear solver.
    pub fn is_nonlinear(self) -> bool {
        !matches!(self, GrowthModel::Polynomial)
    }
}

/// Concrete fitted curve family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    NLogNSquared,
    NLogN,
    Quadratic,
}

impl CurveKind {
    /// Number of parameters in `FitCurve::params`.
    pub fn param_count(self) -> usize {
        match self {
            CurveKind::NLogNSquared | CurveKind::NLogN => 2,
            CurveKind::Quadratic => 3,
        }
    }

    /// Label naming the fitting strategy (shown in titles and summaries).
    pub fn model_type(self) -> &'static str {
        match self {
            CurveKind::NLogNSquared => "nlog²(n) fit",
            CurveKind::NLogN => "nlog(n) fit",
            CurveKind::Quadratic => "Polynomial fit",
        }
    }
}

/// A fitted curve: model family plus parameter vector.
///
/// Parameters are ordered from the leading coefficient down:
/// `[a, b]` for the log models and `[a, b, c]` for the quadratic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCurve {
    pub kind: CurveKind,
    pub params: Vec<f64>,
}

impl FitCurve {
    pub fn evaluate(&self, x: f64) -> f64 {
        crate::models::predict(self.kind, x, &self.params)
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    pub fn equation(&self) -> String {
        crate::models::format_equation(self.kind, &self.params)
    }
}

/// Which path produced a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    /// The requested model was fitted directly.
    Fitted,
    /// The nonlinear solver failed and the quadratic fallback was used.
    FallbackFitted { reason: String },
}

impl FitOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, FitOutcome::FallbackFitted { .. })
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub n: usize,
    /// Solver iterations (0 for the closed-form polynomial fit).
    pub iterations: usize,
}

/// Fit output for a single dataset.
///
/// Created once per dataset and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub name: String,
    /// Raw sizes the fit was trained on.
    pub x: Vec<f64>,
    /// Raw mean times the fit was trained on.
    pub y: Vec<f64>,
    /// Dense x-grid over `[min(x), max(x)]` for the dataset's own figure.
    pub x_trend: Vec<f64>,
    pub model: GrowthModel,
    pub curve: FitCurve,
    pub equation: String,
    pub model_type: String,
    pub outcome: FitOutcome,
    pub quality: FitQuality,
}

impl FitResult {
    /// Evaluate the fitted curve over `xs`.
    pub fn fit_func(&self, xs: &[f64]) -> Vec<f64> {
        self.curve.evaluate_many(xs)
    }

    /// Fitted values over `x_trend`.
    pub fn y_trend(&self) -> Vec<f64> {
        self.fit_func(&self.x_trend)
    }

    /// Legend label used in the comparison figure.
    pub fn label(&self) -> String {
        format!("{}: {}", self.name, self.equation)
    }
}

/// A dataset file that was skipped, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDataset {
    pub path: PathBuf,
    pub reason: String,
}

/// Pixel size of a rendered figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

/// Configuration for an `analyze` run, derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Render PNG figures (disabled in tests and with `--no-plots`).
    pub render: bool,
    pub analysis_size: FigureSize,
    pub comparison_size: FigureSize,
    pub max_iterations: usize,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

/// Configuration for a `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub out_dir: PathBuf,
    pub lower: u64,
    pub upper: u64,
    pub step: u64,
    pub runs: usize,
    /// Relative Gaussian noise applied to each simulated run.
    pub noise: f64,
    pub seed: u64,
}
