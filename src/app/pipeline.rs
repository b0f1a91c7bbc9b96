//! The analysis pipeline.
//!
//! discover files -> per file: load -> fit -> render analysis figure ->
//! accumulate -> build comparison -> render comparison -> exports
//!
//! Per-dataset failures (load, fit, or render) are logged and the dataset is
//! skipped; they never abort the run.
//! Keeping the workflow here lets the CLI focus on presentation.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::domain::{AnalyzeConfig, FitResult, SkippedDataset};
use crate::error::AppError;
use crate::fit::{Comparison, FitOptions, fit};
use crate::io::export::{write_fits_csv, write_fits_json};
use crate::io::ingest::{discover_datasets, load_dataset};
use crate::math::LmOptions;
use crate::plot::{analysis_path, combined_path, render_comparison, render_dataset_figure};

/// All computed outputs of a single `perf analyze` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Successful fits, in processing (sorted path) order.
    pub fits: Vec<FitResult>,
    pub skipped: Vec<SkippedDataset>,
    /// `None` when no dataset could be fitted.
    pub comparison: Option<Comparison>,
    /// Every file written (figures and exports).
    pub written: Vec<PathBuf>,
}

struct ProcessedDataset {
    fit: FitResult,
    figure: Option<PathBuf>,
}

/// Execute the full analysis pipeline and return the computed outputs.
pub fn run_analysis(config: &AnalyzeConfig) -> Result<RunOutput, AppError> {
    let files = discover_datasets(&config.data_dir)?;
    info!(
        data_dir = %config.data_dir.display(),
        files = files.len(),
        "Found benchmark datasets"
    );

    if config.render {
        std::fs::create_dir_all(&config.out_dir).map_err(|e| {
            AppError::new(5, format!("Failed to create output directory '{}': {e}", config.out_dir.display()))
        })?;
    }

    let opts = fit_options(config);

    let mut fits = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();
    let mut written = Vec::new();

    for path in &files {
        match process_file(path, config, &opts) {
            Ok(processed) => {
                written.extend(processed.figure);
                fits.push(processed.fit);
            }
            Err(e) => {
                warn!(file = %path.display(), "Skipping dataset: {e}");
                skipped.push(SkippedDataset {
                    path: path.clone(),
                    reason: e.message().to_string(),
                });
            }
        }
    }

    let comparison = match Comparison::build(&fits) {
        Ok(cmp) => {
            if config.render {
                let out = combined_path(&config.out_dir);
                match render_comparison(&cmp, &out, config.comparison_size) {
                    Ok(()) => {
                        info!(path = %out.display(), series = cmp.series.len(), "Combined figure written");
                        written.push(out);
                    }
                    Err(e) => warn!("Combined figure not rendered: {e}"),
                }
            }
            Some(cmp)
        }
        Err(e) => {
            error!("{e}");
            None
        }
    };

    if let Some(path) = &config.export_json {
        write_fits_json(path, &fits)?;
        written.push(path.clone());
    }
    if let Some(path) = &config.export_csv {
        write_fits_csv(path, &fits)?;
        written.push(path.clone());
    }

    Ok(RunOutput {
        fits,
        skipped,
        comparison,
        written,
    })
}

fn fit_options(config: &AnalyzeConfig) -> FitOptions {
    FitOptions {
        solver: LmOptions {
            max_iterations: config.max_iterations,
            ..LmOptions::default()
        },
        ..FitOptions::default()
    }
}

/// Load, fit, and (optionally) render one dataset file.
///
/// Any failure, rendering included, drops the dataset from the run.
fn process_file(path: &Path, config: &AnalyzeConfig, opts: &FitOptions) -> Result<ProcessedDataset, AppError> {
    let loaded = load_dataset(path)?;
    debug!(
        dataset = loaded.dataset.name(),
        rows_read = loaded.rows_read,
        "Loaded dataset"
    );

    let fit = fit(&loaded.dataset, opts)?;
    info!(
        dataset = %fit.name,
        model_type = %fit.model_type,
        equation = %fit.equation,
        r_squared = fit.quality.r_squared,
        "Fitted"
    );

    let figure = if config.render {
        let out = analysis_path(&config.out_dir, &fit.name);
        render_dataset_figure(&loaded.dataset, &fit, &out, config.analysis_size)?;
        Some(out)
    } else {
        None
    };

    Ok(ProcessedDataset { fit, figure })
}
