//! Levenberg–Marquardt nonlinear least squares.
//!
//! Solves
//!
//! ```text
//! minimize Σ (y_i - f(x_i; p))^2
//! ```
//!
//! for a small parameter vector `p`, given the model value and its gradient
//! with respect to `p`.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr
//! ```
//!
//! in column-scaled form (unit diagonal), so the damping behaves the same for
//! parameters of very different magnitudes. Accepted steps shrink `λ`; rejected
//! steps grow it. The search stops on a small relative cost reduction (`ftol`)
//! or a small relative step (`xtol`).
//!
//! Failures are reported as [`SolveError`] and never panic. Callers are expected
//! to recover (the fitter falls back to a polynomial regression).

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// A parametric curve `f(x; p)` that can be fitted by least squares.
pub trait CurveModel {
    fn param_count(&self) -> usize;

    fn value(&self, x: f64, params: &[f64]) -> f64;

    /// Write `∂f/∂p_j` at `x` into `out` (length `param_count()`).
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]);
}

/// Solver settings.
#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Relative cost reduction below which the fit is considered converged.
    pub ftol: f64,
    /// Relative step size below which the fit is considered converged.
    pub xtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            initial_lambda: 1e-3,
        }
    }
}

/// Converged solution.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("x and y lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
    #[error("initial guess has {got} parameters, model expects {expected}")]
    BadInitialGuess { expected: usize, got: usize },
    #[error("need at least {needed} samples to fit {needed} parameters, got {got}")]
    Underdetermined { needed: usize, got: usize },
    #[error("Jacobian is rank deficient (rank {rank} < {params} parameters)")]
    RankDeficient { rank: usize, params: usize },
    #[error("model is not finite at x={x}")]
    NonFinite { x: f64 },
    #[error("damped normal equations stayed singular")]
    Singular,
    #[error("no convergence after {0} iterations")]
    MaxIterations(usize),
}

/// Relative singular value below which a Jacobian column is treated as dependent.
const RANK_RTOL: f64 = 1e-10;
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_MIN: f64 = 1e-15;

/// Fit `model` to `(x, y)` starting from `initial`.
pub fn levenberg_marquardt<M: CurveModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    opts: &LmOptions,
) -> Result<LmReport, SolveError> {
    let p = model.param_count();
    if x.len() != y.len() {
        return Err(SolveError::LengthMismatch { x: x.len(), y: y.len() });
    }
    if initial.len() != p {
        return Err(SolveError::BadInitialGuess {
            expected: p,
            got: initial.len(),
        });
    }
    if x.len() < p {
        return Err(SolveError::Underdetermined {
            needed: p,
            got: x.len(),
        });
    }

    let mut params = DVector::from_row_slice(initial);
    let (mut residuals, mut sse) = evaluate_residuals(model, x, y, params.as_slice())?;
    let mut jac = evaluate_jacobian(model, x, params.as_slice())?;

    let rank = column_rank(&jac);
    if rank < p {
        return Err(SolveError::RankDeficient { rank, params: p });
    }

    let mut lambda = opts.initial_lambda;

    for iter in 1..=opts.max_iterations {
        if sse == 0.0 {
            return Ok(LmReport {
                params: params.iter().copied().collect(),
                sse,
                iterations: iter - 1,
            });
        }

        let jtj = jac.transpose() * &jac;
        let jtr = jac.transpose() * &residuals;

        // Column scaling: s_j = sqrt((JᵀJ)_jj). Rank was checked, but guard
        // against underflow anyway.
        let scale = DVector::from_iterator(
            p,
            (0..p).map(|j| {
                let d = jtj[(j, j)].sqrt();
                if d.is_finite() && d > 0.0 { d } else { 1.0 }
            }),
        );

        let step = loop {
            let mut a = DMatrix::<f64>::zeros(p, p);
            for i in 0..p {
                for j in 0..p {
                    a[(i, j)] = jtj[(i, j)] / (scale[i] * scale[j]);
                }
                a[(i, i)] += lambda;
            }
            let g = DVector::from_iterator(p, (0..p).map(|j| jtr[j] / scale[j]));

            if let Some(chol) = a.cholesky() {
                let z = chol.solve(&g);
                break DVector::from_iterator(p, (0..p).map(|j| z[j] / scale[j]));
            }
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(SolveError::Singular);
            }
        };

        let candidate = &params + &step;
        let step_small = step.norm() <= opts.xtol * (candidate.norm() + opts.xtol);

        let trial = evaluate_residuals(model, x, y, candidate.as_slice());
        match trial {
            Ok((r_new, sse_new)) if sse_new < sse => {
                let reduction = sse - sse_new;
                params = candidate;
                residuals = r_new;
                let sse_old = sse;
                sse = sse_new;
                jac = evaluate_jacobian(model, x, params.as_slice())?;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                if reduction <= opts.ftol * sse_old || step_small {
                    return Ok(LmReport {
                        params: params.iter().copied().collect(),
                        sse,
                        iterations: iter,
                    });
                }
            }
            _ => {
                // Rejected step. If even the rejected step is negligible, we are
                // sitting at the minimum already.
                if step_small {
                    return Ok(LmReport {
                        params: params.iter().copied().collect(),
                        sse,
                        iterations: iter,
                    });
                }
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    return Err(SolveError::Singular);
                }
            }
        }
    }

    Err(SolveError::MaxIterations(opts.max_iterations))
}

fn evaluate_residuals<M: CurveModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    params: &[f64],
) -> Result<(DVector<f64>, f64), SolveError> {
    let mut r = DVector::<f64>::zeros(x.len());
    for (i, (&xi, &yi)) in x.iter().zip(y.iter()).enumerate() {
        let fi = model.value(xi, params);
        if !fi.is_finite() || !yi.is_finite() {
            return Err(SolveError::NonFinite { x: xi });
        }
        r[i] = yi - fi;
    }
    let sse = r.norm_squared();
    if !sse.is_finite() {
        return Err(SolveError::NonFinite { x: f64::NAN });
    }
    Ok((r, sse))
}

fn evaluate_jacobian<M: CurveModel>(model: &M, x: &[f64], params: &[f64]) -> Result<DMatrix<f64>, SolveError> {
    let p = model.param_count();
    let mut jac = DMatrix::<f64>::zeros(x.len(), p);
    let mut row = vec![0.0; p];
    for (i, &xi) in x.iter().enumerate() {
        model.gradient(xi, params, &mut row);
        for j in 0..p {
            if !row[j].is_finite() {
                return Err(SolveError::NonFinite { x: xi });
            }
            jac[(i, j)] = row[j];
        }
    }
    Ok(jac)
}

/// Numerical column rank of `m` after normalizing each column.
fn column_rank(m: &DMatrix<f64>) -> usize {
    let mut scaled = m.clone();
    for mut col in scaled.column_iter_mut() {
        let norm = col.norm();
        if norm > 0.0 {
            col /= norm;
        }
    }
    let sv = scaled.singular_values();
    let sv_max = sv.max();
    if !sv_max.is_finite() || sv_max <= 0.0 {
        return 0;
    }
    sv.iter().filter(|&&s| s > RANK_RTOL * sv_max).count()
}
