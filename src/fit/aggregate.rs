//! Cross-dataset comparison.
//!
//! All fitted curves are evaluated on one shared x-grid spanning every
//! dataset's sizes, and both comparison panels share one y bound, so relative
//! magnitudes read correctly across datasets.

use serde::{Deserialize, Serialize};

use crate::domain::FitResult;
use crate::error::AppError;
use crate::math::{linspace, min_max};

/// Points in the shared comparison grid.
pub const SHARED_POINTS: usize = 200;

/// Headroom multiplier applied to the largest observed time.
pub const Y_HEADROOM: f64 = 1.1;

/// One dataset's contribution to the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSeries {
    pub name: String,
    /// `"{name}: {equation}"`
    pub label: String,
    /// Position in the input list; the renderer maps it onto a cyclic palette.
    pub index: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Fitted values over `Comparison::x_shared`.
    pub y_fit: Vec<f64>,
}

/// Everything needed to draw the comparison figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub x_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub y_max_with_buffer: f64,
    pub x_shared: Vec<f64>,
    pub series: Vec<ComparisonSeries>,
}

impl Comparison {
    /// Build the comparison from every successful fit, in accumulation order.
    pub fn build(results: &[FitResult]) -> Result<Self, AppError> {
        if results.is_empty() {
            return Err(AppError::new(3, "No successful fits to compare."));
        }

        let all_x: Vec<f64> = results.iter().flat_map(|r| r.x.iter().copied()).collect();
        let all_y: Vec<f64> = results.iter().flat_map(|r| r.y.iter().copied()).collect();

        let (x_min, x_max) = min_max(&all_x)
            .ok_or_else(|| AppError::new(3, "Fit results contain no sizes to compare."))?;
        let (_, y_max) = min_max(&all_y)
            .ok_or_else(|| AppError::new(3, "Fit results contain no times to compare."))?;

        let y_max_with_buffer = y_max * Y_HEADROOM;
        let x_shared = linspace(x_min, x_max, SHARED_POINTS);

        let series = results
            .iter()
            .enumerate()
            .map(|(index, r)| ComparisonSeries {
                name: r.name.clone(),
                label: r.label(),
                index,
                x: r.x.clone(),
                y: r.y.clone(),
                y_fit: r.fit_func(&x_shared),
            })
            .collect();

        Ok(Self {
            x_min,
            x_max,
            y_max,
            y_max_with_buffer,
            x_shared,
            series,
        })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.label.as_str()).collect()
    }
}
