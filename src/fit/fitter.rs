//! Fitting routine for a single dataset.
//!
//! Given:
//! - the dataset name (which selects the growth model)
//! - sizes `n_i`
//! - mean times `t_i`
//!
//! we:
//! - fit the selected log model by Levenberg–Marquardt, starting from `(1, 1)`
//! - on any solver failure, log the reason and fit `a·n² + b·n + c` instead
//! - fit the quadratic directly for datasets without a named model
//!
//! Solver failures never escape this module. The only errors returned are for
//! malformed input arrays, which a validated `Dataset` cannot produce.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::domain::{CurveKind, Dataset, FitCurve, FitOutcome, FitQuality, FitResult};
use crate::error::AppError;
use crate::fit::selection::resolve_model;
use crate::math::{LmOptions, LmReport, SolveError, levenberg_marquardt, linspace, min_max, solve_least_squares};
use crate::models::fill_design_row;

/// Points in each dataset's own trend line.
pub const TREND_POINTS: usize = 100;

/// Starting point for the nonlinear solver (`a`, `b`).
const INITIAL_GUESS: [f64; 2] = [1.0, 1.0];

/// Fitting options.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub solver: LmOptions,
    pub trend_points: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            solver: LmOptions::default(),
            trend_points: TREND_POINTS,
        }
    }
}

/// Fit a validated dataset.
pub fn fit(dataset: &Dataset, opts: &FitOptions) -> Result<FitResult, AppError> {
    fit_series(dataset.name(), &dataset.sizes(), &dataset.mean_times(), opts)
}

/// Fit raw `(x, y)` samples under the model selected by `name`.
pub fn fit_series(name: &str, x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult, AppError> {
    if x.len() != y.len() {
        return Err(AppError::new(
            4,
            format!("Dataset '{name}': x/y length mismatch ({} vs {}).", x.len(), y.len()),
        ));
    }
    let (x_min, x_max) = min_max(x).ok_or_else(|| AppError::new(3, format!("Dataset '{name}' has no samples.")))?;

    let model = resolve_model(name);
    let x_trend = linspace(x_min, x_max, opts.trend_points);

    let (curve, outcome, iterations) = if model.is_nonlinear() {
        let kind = model.target_curve();
        match fit_nonlinear(kind, x, y, &opts.solver) {
            Ok(report) => {
                debug!(
                    dataset = name,
                    model = kind.model_type(),
                    iterations = report.iterations,
                    sse = report.sse,
                    "Nonlinear fit converged"
                );
                let curve = FitCurve {
                    kind,
                    params: report.params,
                };
                (curve, FitOutcome::Fitted, report.iterations)
            }
            Err(e) => {
                warn!(
                    dataset = name,
                    model = kind.model_type(),
                    "Error fitting {} model: {e}. Falling back to polynomial fit.",
                    kind.model_type()
                );
                let curve = fit_polynomial(x, y)?;
                (curve, FitOutcome::FallbackFitted { reason: e.to_string() }, 0)
            }
        }
    } else {
        (fit_polynomial(x, y)?, FitOutcome::Fitted, 0)
    };

    let quality = fit_quality(&curve, x, y, iterations);
    let equation = curve.equation();
    let model_type = curve.kind.model_type().to_string();

    Ok(FitResult {
        name: name.to_string(),
        x: x.to_vec(),
        y: y.to_vec(),
        x_trend,
        model,
        curve,
        equation,
        model_type,
        outcome,
        quality,
    })
}

fn fit_nonlinear(kind: CurveKind, x: &[f64], y: &[f64], opts: &LmOptions) -> Result<LmReport, SolveError> {
    let report = levenberg_marquardt(&kind, x, y, &INITIAL_GUESS, opts)?;
    if report.params.iter().any(|p| !p.is_finite()) {
        return Err(SolveError::NonFinite { x: f64::NAN });
    }
    Ok(report)
}

/// Degree-2 polynomial regression `a·n² + b·n + c`.
///
/// Rank-deficient inputs (fewer than 3 distinct sizes) yield the minimum-norm
/// solution, so this only fails on non-finite inputs.
pub fn fit_polynomial(x: &[f64], y: &[f64]) -> Result<FitCurve, AppError> {
    let kind = CurveKind::Quadratic;
    let p = kind.param_count();
    let n = x.len();

    let mut design = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &xi) in x.iter().enumerate() {
        fill_design_row(kind, xi, &mut row);
        for j in 0..p {
            design[(i, j)] = row[j];
        }
    }
    let obs = DVector::from_row_slice(y);

    let beta = solve_least_squares(&design, &obs)
        .ok_or_else(|| AppError::new(4, "Polynomial regression failed: non-finite input values."))?;

    Ok(FitCurve {
        kind,
        params: beta.iter().copied().collect(),
    })
}

fn fit_quality(curve: &FitCurve, x: &[f64], y: &[f64], iterations: usize) -> FitQuality {
    let n = y.len();
    let sse: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - curve.evaluate(xi);
            r * r
        })
        .sum();

    let mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|&yi| (yi - mean) * (yi - mean)).sum();
    let r_squared = if sst > 0.0 {
        1.0 - sse / sst
    } else if sse == 0.0 {
        1.0
    } else {
        0.0
    };

    FitQuality {
        sse,
        rmse: (sse / n as f64).sqrt(),
        r_squared,
        n,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BenchSample, GrowthModel, QUANTILE_COUNT};

    fn sizes() -> Vec<f64> {
        (0..20).map(|i| 8.0 + 26.0 * i as f64).collect()
    }

    /// Deterministic ±1% wobble.
    fn wobble(i: usize) -> f64 {
        1.0 + 0.01 * (i as f64 * 1.7).sin()
    }

    fn nlogn(n: f64) -> f64 {
        n * n.log2()
    }

    fn nlog2n(n: f64) -> f64 {
        n * n.log2().powi(2)
    }

    #[test]
    fn nlogn_dataset_fits_nlogn() {
        let x = sizes();
        let y: Vec<f64> = x.iter().map(|&n| 3.0 * nlogn(n) + 250.0).collect();

        let fit = fit_series("divide_and_conquer_improved", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.model, GrowthModel::NLogN);
        assert_eq!(fit.model_type, "nlog(n) fit");
        assert_eq!(fit.outcome, FitOutcome::Fitted);
        assert!((fit.curve.params[0] - 3.0).abs() < 1e-6, "a={}", fit.curve.params[0]);
        assert!((fit.curve.params[1] - 250.0).abs() < 1e-3, "b={}", fit.curve.params[1]);
        assert_eq!(fit.equation, "3.0000 · nlog₂(n) + 250.00");
    }

    #[test]
    fn nlog2n_dataset_fits_nlog2n_with_noise() {
        let x = sizes();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &n)| (1.5 * nlog2n(n) + 1000.0) * wobble(i))
            .collect();

        let fit = fit_series("divide_and_conquer", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.model_type, "nlog²(n) fit");
        assert!((fit.curve.params[0] - 1.5).abs() < 0.05, "a={}", fit.curve.params[0]);
        assert!(fit.quality.r_squared > 0.99);
    }

    #[test]
    fn converged_fit_beats_constant_mean() {
        let x = sizes();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &n)| (0.7 * nlogn(n) + 40.0) * (1.0 + 0.2 * (i as f64 * 2.3).cos()))
            .collect();

        let fit = fit_series("divide_and_conquer_improved", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.outcome, FitOutcome::Fitted);

        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let sse_mean: f64 = y.iter().map(|v| (v - mean) * (v - mean)).sum();
        let sse_fit: f64 = fit
            .fit_func(&x)
            .iter()
            .zip(y.iter())
            .map(|(f, v)| (v - f) * (v - f))
            .sum();
        assert!(sse_fit <= sse_mean, "fit SSE {sse_fit} > mean SSE {sse_mean}");
    }

    #[test]
    fn unknown_name_uses_polynomial_directly() {
        let x = sizes();
        let y: Vec<f64> = x.iter().map(|&n| 0.25 * n * n - 2.0 * n + 90.0).collect();

        let fit = fit_series("linear_search", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.model, GrowthModel::Polynomial);
        assert_eq!(fit.model_type, "Polynomial fit");
        assert_eq!(fit.outcome, FitOutcome::Fitted);
        assert_eq!(fit.quality.iterations, 0);
        assert!((fit.curve.params[0] - 0.25).abs() < 1e-8);
        assert!((fit.curve.params[1] + 2.0).abs() < 1e-5);
        assert!((fit.curve.params[2] - 90.0).abs() < 1e-2);
    }

    #[test]
    fn single_distinct_size_falls_back_to_polynomial() {
        let x = vec![64.0; 4];
        let y = vec![10.0, 12.0, 11.0, 9.0];

        let fit = fit_series("divide_and_conquer", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.model_type, "Polynomial fit");
        assert!(fit.outcome.is_fallback());
        assert!(fit.curve.params.iter().all(|p| p.is_finite()));
        assert!((fit.curve.evaluate(64.0) - 10.5).abs() < 1e-6);
    }

    #[test]
    fn zero_size_under_log_model_falls_back() {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![1.0, 2.0, 5.0, 10.0, 17.0];

        let fit = fit_series("divide_and_conquer_improved", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.model_type, "Polynomial fit");
        match &fit.outcome {
            FitOutcome::FallbackFitted { reason } => assert!(reason.contains("not finite"), "{reason}"),
            other => panic!("expected fallback, got {other:?}"),
        }
        // y = n² + 1
        assert!((fit.curve.params[0] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn iteration_cap_falls_back() {
        let x = sizes();
        let y: Vec<f64> = x.iter().map(|&n| 3.0 * nlogn(n) + 250.0).collect();
        let opts = FitOptions {
            solver: LmOptions {
                max_iterations: 0,
                ..LmOptions::default()
            },
            ..FitOptions::default()
        };

        let fit = fit_series("divide_and_conquer_improved", &x, &y, &opts).unwrap();
        assert_eq!(fit.model_type, "Polynomial fit");
        assert!(fit.outcome.is_fallback());
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        let x = sizes();
        let y: Vec<f64> = x.iter().map(|&n| 2.0 * nlog2n(n) + 5.0).collect();

        let fit = fit_series("Divide_And_Conquer", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.model_type, "nlog²(n) fit");
        assert_eq!(fit.name, "Divide_And_Conquer");
    }

    #[test]
    fn fitting_is_deterministic() {
        let x = sizes();
        let y: Vec<f64> = x.iter().enumerate().map(|(i, &n)| nlog2n(n) * wobble(i)).collect();

        let a = fit_series("divide_and_conquer", &x, &y, &FitOptions::default()).unwrap();
        let b = fit_series("divide_and_conquer", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(a.equation, b.equation);
        assert_eq!(a.model_type, b.model_type);
    }

    #[test]
    fn trend_grid_spans_sizes() {
        let x = sizes();
        let y: Vec<f64> = x.iter().map(|&n| n).collect();

        let fit = fit_series("other", &x, &y, &FitOptions::default()).unwrap();
        assert_eq!(fit.x_trend.len(), TREND_POINTS);
        assert_eq!(fit.x_trend[0], 8.0);
        assert_eq!(fit.x_trend[TREND_POINTS - 1], 502.0);
        assert_eq!(fit.y_trend().len(), TREND_POINTS);
    }

    #[test]
    fn malformed_arrays_are_errors() {
        let err = fit_series("x", &[1.0, 2.0], &[1.0], &FitOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        let err = fit_series("x", &[], &[], &FitOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn fit_uses_dataset_rows() {
        let samples: Vec<BenchSample> = sizes()
            .iter()
            .map(|&n| BenchSample {
                n: n as u64,
                t_mean: 4.0 * nlogn(n) + 12.0,
                t_stdev: 1.0,
                quantiles: [0.0; QUANTILE_COUNT],
            })
            .collect();
        let ds = Dataset::new("divide_and_conquer_improved", samples).unwrap();

        let fit = fit(&ds, &FitOptions::default()).unwrap();
        assert_eq!(fit.x.len(), 20);
        assert_eq!(fit.equation, "4.0000 · nlog₂(n) + 12.00");
    }
}
