//! Model evaluation for the growth-curve families.
//!
//! The fitter relies on two primitive operations:
//! - build a design row (gradient) for a given size `n` (for least squares)
//! - predict `t(n)` given the parameters (for residuals/plots)
//!
//! Both are implemented here for each curve kind, plus the equation strings
//! shown in figure annotations and legends.
//!
//! Log-based curves use `log2(n)` and require `n > 0`; for `n <= 0` they
//! return a non-finite value, which the solver reports as a failure.

use crate::domain::CurveKind;
use crate::math::CurveModel;

/// Fill a design row for the given curve kind.
///
/// Every curve is linear in its parameters, so the row is also the gradient
/// of `predict` with respect to the parameters.
///
/// # Panics
/// Panics if `out` is shorter than `kind.param_count()`.
pub fn fill_design_row(kind: CurveKind, n: f64, out: &mut [f64]) {
    match kind {
        CurveKind::NLogNSquared => {
            let l = n.log2();
            out[0] = n * l * l;
            out[1] = 1.0;
        }
        CurveKind::NLogN => {
            out[0] = n * n.log2();
            out[1] = 1.0;
        }
        CurveKind::Quadratic => {
            out[0] = n * n;
            out[1] = n;
            out[2] = 1.0;
        }
    }
}

/// Predict `t(n)` for the given curve kind.
pub fn predict(kind: CurveKind, n: f64, params: &[f64]) -> f64 {
    match kind {
        CurveKind::NLogNSquared => {
            let l = n.log2();
            params[0] * n * l * l + params[1]
        }
        CurveKind::NLogN => params[0] * n * n.log2() + params[1],
        CurveKind::Quadratic => params[0] * n * n + params[1] * n + params[2],
    }
}

/// Human-readable equation.
///
/// The leading coefficient always gets 4 decimals and trailing terms 2,
/// whatever their magnitude or sign.
pub fn format_equation(kind: CurveKind, params: &[f64]) -> String {
    match kind {
        CurveKind::NLogNSquared => format!(
            "{} · nlog₂(n)² + {}",
            fmt_coef(params[0], 4),
            fmt_coef(params[1], 2)
        ),
        CurveKind::NLogN => format!(
            "{} · nlog₂(n) + {}",
            fmt_coef(params[0], 4),
            fmt_coef(params[1], 2)
        ),
        CurveKind::Quadratic => format!(
            "{}n² + {}n + {}",
            fmt_coef(params[0], 4),
            fmt_coef(params[1], 2),
            fmt_coef(params[2], 2)
        ),
    }
}

fn fmt_coef(v: f64, decimals: usize) -> String {
    // Fold -0.0 into 0.0.
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v:.decimals$}")
}

impl CurveModel for CurveKind {
    fn param_count(&self) -> usize {
        CurveKind::param_count(*self)
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        predict(*self, x, params)
    }

    fn gradient(&self, x: f64, _params: &[f64], out: &mut [f64]) {
        fill_design_row(*self, x, out);
    }
}
