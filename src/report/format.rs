//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{FitOutcome, FitResult, SkippedDataset};

const NAME_WIDTH: usize = 28;
const MODEL_WIDTH: usize = 14;

/// Format the run summary: one line per fitted dataset, then skipped files.
pub fn format_run_summary(fits: &[FitResult], skipped: &[SkippedDataset]) -> String {
    let mut out = String::new();

    out.push_str("=== perf - Benchmark Growth Fits ===\n");
    out.push_str(&format!(
        "Datasets: {} fitted | {} skipped\n",
        fits.len(),
        skipped.len()
    ));

    if !fits.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "  {:<NAME_WIDTH$} {:<MODEL_WIDTH$} {:>6} {:>8}  Equation\n",
            "Dataset", "Model", "Points", "R²"
        ));
        for fit in fits {
            out.push_str(&format_fit_line(fit));
            out.push('\n');
        }
    }

    let fallbacks: Vec<(&str, &str)> = fits
        .iter()
        .filter_map(|f| match &f.outcome {
            FitOutcome::FallbackFitted { reason } => Some((f.name.as_str(), reason.as_str())),
            FitOutcome::Fitted => None,
        })
        .collect();
    if !fallbacks.is_empty() {
        out.push_str("\nPolynomial fallbacks:\n");
        for (name, reason) in fallbacks {
            out.push_str(&format!("  {name}: {reason}\n"));
        }
    }

    if !skipped.is_empty() {
        out.push_str("\nSkipped:\n");
        for s in skipped {
            out.push_str(&format!("  {}: {}\n", s.path.display(), s.reason));
        }
    }

    out
}

fn format_fit_line(fit: &FitResult) -> String {
    // `*` marks a fit that fell back to the polynomial.
    let marker = if fit.outcome.is_fallback() { "*" } else { " " };
    format!(
        "{marker} {:<NAME_WIDTH$} {:<MODEL_WIDTH$} {:>6} {:>8.4}  {}",
        truncate(&fit.name, NAME_WIDTH),
        fit.model_type,
        fit.quality.n,
        fit.quality.r_squared,
        fit.equation
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
