//! Linear least squares solver.
//!
//! The quadratic fallback is linear in its coefficients, so we solve:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD so tall design matrices (more rows than columns) are handled
//!   directly. (Nalgebra's `QR::solve` is intended for square systems and will
//!   panic for non-square matrices.)
//! - Columns are normalized to unit length before the SVD. Benchmark sizes span
//!   several orders of magnitude (`n²` vs `1`), and the singular-value cutoff is
//!   only meaningful once the columns share a scale.
//! - The cutoff is relative to the largest singular value. Rank-deficient designs
//!   (e.g. a single distinct size) yield the minimum-norm solution instead of
//!   exploding coefficients.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the inputs are non-finite or the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let scales: Vec<f64> = x
        .column_iter()
        .map(|col| {
            let norm = col.norm();
            if norm > 0.0 { norm } else { 1.0 }
        })
        .collect();

    let mut scaled = x.clone();
    for (j, mut col) in scaled.column_iter_mut().enumerate() {
        col /= scales[j];
    }

    let svd = scaled.svd(true, true);
    let sv_max = svd.singular_values.max();
    if !(sv_max.is_finite() && sv_max > 0.0) {
        // All-zero design: the minimum-norm solution is zero.
        return Some(DVector::zeros(x.ncols()));
    }

    // Try progressively looser tolerances if strict solve fails.
    for &rel in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, rel * sv_max) {
            let beta = DVector::from_iterator(
                beta.len(),
                beta.iter().zip(scales.iter()).map(|(b, s)| b / s),
            );
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_recovers_quadratic_on_wide_scale() {
        // y = 0.5 n² + 3 n + 100 with n up to 1e4.
        let ns = [10.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0];
        let mut rows = Vec::new();
        let mut ys = Vec::new();
        for &n in &ns {
            rows.extend_from_slice(&[n * n, n, 1.0]);
            ys.push(0.5 * n * n + 3.0 * n + 100.0);
        }
        let x = DMatrix::from_row_slice(ns.len(), 3, &rows);
        let y = DVector::from_row_slice(&ys);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 0.5).abs() < 1e-9);
        assert!((beta[1] - 3.0).abs() < 1e-5);
        assert!((beta[2] - 100.0).abs() < 1e-2);
    }

    #[test]
    fn least_squares_rank_deficient_is_finite() {
        // Every row identical: rank 1.
        let x = DMatrix::from_row_slice(3, 3, &[100.0, 10.0, 1.0, 100.0, 10.0, 1.0, 100.0, 10.0, 1.0]);
        let y = DVector::from_row_slice(&[5.0, 7.0, 6.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!(beta.iter().all(|v| v.is_finite()));
        let fitted = 100.0 * beta[0] + 10.0 * beta[1] + beta[2];
        assert!((fitted - 6.0).abs() < 1e-6, "fitted={fitted}");
    }

    #[test]
    fn least_squares_rejects_nan() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
