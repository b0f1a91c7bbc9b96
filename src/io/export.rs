//! Export fit summaries (JSON/CSV) and benchmark datasets (CSV).
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BenchSample, CurveKind, FitOutcome, FitQuality, FitResult, GrowthModel};
use crate::error::AppError;

/// One fitted dataset in the JSON summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub name: String,
    pub model: GrowthModel,
    pub kind: CurveKind,
    pub model_type: String,
    pub equation: String,
    pub params: Vec<f64>,
    pub outcome: FitOutcome,
    pub quality: FitQuality,
}

impl From<&FitResult> for FitSummary {
    fn from(r: &FitResult) -> Self {
        Self {
            name: r.name.clone(),
            model: r.model,
            kind: r.curve.kind,
            model_type: r.model_type.clone(),
            equation: r.equation.clone(),
            params: r.curve.params.clone(),
            outcome: r.outcome.clone(),
            quality: r.quality.clone(),
        }
    }
}

/// Top-level JSON summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummaryFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub fits: Vec<FitSummary>,
}

/// Flat CSV row; `params` is `;`-joined so every model fits the same columns.
#[derive(Debug, Serialize)]
struct FitCsvRow<'a> {
    name: &'a str,
    model_type: &'a str,
    equation: &'a str,
    params: String,
    sse: f64,
    rmse: f64,
    r_squared: f64,
    n: usize,
    fallback_reason: &'a str,
}

/// Write all fits as a pretty-printed JSON document.
pub fn write_fits_json(path: &Path, fits: &[FitResult]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(5, format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    let summary = FitSummaryFile {
        tool: "perf".to_string(),
        generated_at: Utc::now(),
        fits: fits.iter().map(FitSummary::from).collect(),
    };

    serde_json::to_writer_pretty(file, &summary)
        .map_err(|e| AppError::new(5, format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}

/// Read a JSON summary written by [`write_fits_json`].
pub fn read_fits_json(path: &Path) -> Result<FitSummaryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid summary JSON: {e}")))
}

/// Write one row per fit to a CSV file.
pub fn write_fits_csv(path: &Path, fits: &[FitResult]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(5, format!("Failed to create summary CSV '{}': {e}", path.display())))?;

    for r in fits {
        let fallback_reason = match &r.outcome {
            FitOutcome::Fitted => "",
            FitOutcome::FallbackFitted { reason } => reason.as_str(),
        };
        let params = r
            .curve
            .params
            .iter()
            .map(|p| format!("{p:e}"))
            .collect::<Vec<_>>()
            .join(";");

        writer
            .serialize(FitCsvRow {
                name: &r.name,
                model_type: &r.model_type,
                equation: &r.equation,
                params,
                sse: r.quality.sse,
                rmse: r.quality.rmse,
                r_squared: r.quality.r_squared,
                n: r.quality.n,
                fallback_reason,
            })
            .map_err(|e| AppError::new(5, format!("Failed to write summary CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(5, format!("Failed to flush summary CSV: {e}")))?;
    Ok(())
}

/// Write benchmark rows in the ingest schema (`n,t_mean,t_stdev,t_Q0..t_Q4`).
pub fn write_dataset_csv(path: &Path, samples: &[BenchSample]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(5, format!("Failed to create dataset CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["n", "t_mean", "t_stdev", "t_Q0", "t_Q1", "t_Q2", "t_Q3", "t_Q4"])
        .map_err(|e| AppError::new(5, format!("Failed to write dataset CSV header: {e}")))?;

    for s in samples {
        let mut record = Vec::with_capacity(8);
        record.push(s.n.to_string());
        record.push(s.t_mean.to_string());
        record.push(s.t_stdev.to_string());
        record.extend(s.quantiles.iter().map(|q| q.to_string()));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(5, format!("Failed to write dataset CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(5, format!("Failed to flush dataset CSV: {e}")))?;
    Ok(())
}
