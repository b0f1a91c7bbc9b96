//! PNG figure rendering (plotters bitmap backend).
//!
//! - per-dataset diagnostic figure (`analysis`)
//! - cross-dataset comparison figure (`comparison`)
//! - cyclic series colors (`palette`)
//!
//! All series and bounds are computed before drawing; the render functions only
//! draw. Every plotters error is mapped to an `AppError` with exit code 5 so the
//! pipeline can log it and keep going.

use std::error::Error;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub mod analysis;
pub mod comparison;
pub mod palette;

pub use analysis::*;
pub use comparison::*;
pub use palette::*;

/// File name of the comparison figure inside the output directory.
pub const COMBINED_FILE_NAME: &str = "combined_fit_curves.png";

/// `<out_dir>/<dataset>_analysis.png`
pub fn analysis_path(out_dir: &Path, dataset: &str) -> PathBuf {
    out_dir.join(format!("{dataset}_analysis.png"))
}

/// `<out_dir>/combined_fit_curves.png`
pub fn combined_path(out_dir: &Path) -> PathBuf {
    out_dir.join(COMBINED_FILE_NAME)
}

/// Axis range over `[lo, hi]` with 5% padding on both ends.
///
/// Degenerate or non-finite bounds still produce a drawable (non-empty) range.
pub fn padded_range(lo: f64, hi: f64) -> Range<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return 0.0..1.0;
    }
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(1.0) {
        let pad = (lo.abs() * 0.05).max(0.5);
        return (lo - pad)..(hi + pad);
    }
    let pad = span * 0.05;
    (lo - pad)..(hi + pad)
}

/// `0..top`, falling back to `0..1` when `top` is not a positive number.
pub fn zero_based_range(top: f64) -> Range<f64> {
    if top.is_finite() && top > 0.0 {
        0.0..top
    } else {
        0.0..1.0
    }
}

/// Tick label for time axes: plain below 10⁵, scientific above.
pub fn axis_label(v: f64) -> String {
    if v.abs() >= 1e5 {
        format!("{v:.1e}")
    } else if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn render_error(path: &Path, e: Box<dyn Error>) -> AppError {
    AppError::new(5, format!("Failed to render '{}': {e}", path.display()))
}
