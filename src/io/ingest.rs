//! Dataset discovery and CSV ingest.
//!
//! This module turns a directory of benchmark CSVs into validated `Dataset`s.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (every bad row is reported; any bad row rejects the file)
//! - **Deterministic behavior** (files are processed in sorted order)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::warn;

use crate::domain::{BenchSample, Dataset, QUANTILE_COUNT};
use crate::error::AppError;

/// Required column names (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 8] = ["n", "t_mean", "t_stdev", "t_q0", "t_q1", "t_q2", "t_q3", "t_q4"];

const QUANTILE_COLUMNS: [&str; QUANTILE_COUNT] = ["t_q0", "t_q1", "t_q2", "t_q3", "t_q4"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the validated dataset.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub rows_read: usize,
}

/// List the `*.csv` files in `dir`, sorted by path.
///
/// A missing directory or a directory without CSV files is an error: the run
/// has nothing to do.
pub fn discover_datasets(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !dir.is_dir() {
        return Err(AppError::new(2, format!("Error: Directory '{}' not found.", dir.display())));
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::new(2, format!("Failed to read directory '{}': {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::new(2, format!("Failed to read directory entry: {e}")))?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(AppError::new(
            2,
            format!("No CSV files found in '{}' directory.", dir.display()),
        ));
    }

    files.sort();
    Ok(files)
}

/// Dataset identifier for a file: its base name without extension.
pub fn dataset_name(path: &Path) -> Result<String, AppError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::new(2, format!("Cannot derive a dataset name from '{}'.", path.display())))
}

/// Load and validate one benchmark CSV.
///
/// A malformed table is rejected as a whole: every bad row is logged, and the
/// error names the first one.
pub fn load_dataset(path: &Path) -> Result<LoadedDataset, AppError> {
    let name = dataset_name(path)?;
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map, path)?;

    let mut samples = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(sample) => samples.push(sample),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        warn!(file = %path.display(), line = err.line, "Malformed row: {}", err.message);
    }
    if let Some(first) = row_errors.first() {
        return Err(AppError::new(
            2,
            format!(
                "Malformed table '{}': {} bad row(s), first at line {}: {}",
                path.display(),
                row_errors.len(),
                first.line,
                first.message
            ),
        ));
    }

    let dataset = Dataset::new(name, samples)?;

    Ok(LoadedDataset { dataset, rows_read })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>, path: &Path) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::new(
        2,
        format!(
            "Missing required column(s) in '{}': {}",
            path.display(),
            missing.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ")
        ),
    ))
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<BenchSample, String> {
    let n_raw = get_required(record, header_map, "n")?;
    let n = parse_size(n_raw)?;

    let t_mean = parse_f64(record, header_map, "t_mean")?;
    let t_stdev = parse_f64(record, header_map, "t_stdev")?;

    let mut quantiles = [0.0; QUANTILE_COUNT];
    for (slot, column) in quantiles.iter_mut().zip(QUANTILE_COLUMNS) {
        *slot = parse_f64(record, header_map, column)?;
    }

    Ok(BenchSample {
        n,
        t_mean,
        t_stdev,
        quantiles,
    })
}

fn parse_size(raw: &str) -> Result<u64, String> {
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n);
    }
    // Accept integral floats such as `128.0`.
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(format!("Invalid size `n` value: `{raw}`.")),
    }
}

fn parse_f64(record: &StringRecord, header_map: &HashMap<String, usize>, column: &str) -> Result<f64, String> {
    let raw = get_required(record, header_map, column)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{column}` value: `{raw}`.")),
    }
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    column: &str,
) -> Result<&'a str, String> {
    header_map
        .get(column)
        .and_then(|&idx| record.get(idx))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{column}` value."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "n,t_mean,t_stdev,t_Q0,t_Q1,t_Q2,t_Q3,t_Q4";

    fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_rows_and_names_dataset_after_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\n16,120.5,3.1,110,115,120,125,140\n8,60.25,2.0,55,58,60,62,70\n");
        let path = write_file(dir.path(), "divide_and_conquer.csv", &body);

        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded.dataset.name(), "divide_and_conquer");
        assert_eq!(loaded.rows_read, 2);
        let samples = loaded.dataset.samples();
        assert_eq!(samples[0].n, 8);
        assert_eq!(samples[1].quantiles, [110.0, 115.0, 120.0, 125.0, 140.0]);
    }

    #[test]
    fn bom_and_case_in_headers_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let body = "\u{feff}N,T_MEAN,t_stdev,t_q0,t_q1,t_q2,t_q3,t_q4\n1,1,0,1,1,1,1,1\n2,2,0,2,2,2,2,2\n";
        let path = write_file(dir.path(), "x.csv", body);

        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded.dataset.samples().len(), 2);
    }

    #[test]
    fn any_bad_row_rejects_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\n8,1,0,1,1,1,1,1\nabc,1,0,1,1,1,1,1\n16,2,0,2,2,2,2,2\n32,,0,1,1,1,1,1\n");
        let path = write_file(dir.path(), "x.csv", &body);

        let err = load_dataset(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("2 bad row(s), first at line 3"));
        assert!(err.message().contains("`n`"));
    }

    #[test]
    fn missing_columns_fail_the_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "x.csv", "n,t_mean\n1,2\n2,3\n");

        let err = load_dataset(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`t_stdev`"));
    }

    #[test]
    fn too_few_rows_fail_the_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\n8,1,0,1,1,1,1,1\n");
        let path = write_file(dir.path(), "x.csv", &body);

        assert!(load_dataset(&path).is_err());
    }

    #[test]
    fn discovery_lists_sorted_csv_files_only() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.csv", HEADER);
        write_file(dir.path(), "a.CSV", HEADER);
        write_file(dir.path(), "notes.txt", "hello");

        let files = discover_datasets(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| dataset_name(p).unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn discovery_fails_on_missing_or_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_datasets(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("No CSV files"));

        let err = discover_datasets(&dir.path().join("missing")).unwrap_err();
        assert!(err.message().contains("not found"));
    }

    #[test]
    fn integral_float_sizes_are_accepted() {
        assert_eq!(parse_size("128"), Ok(128));
        assert_eq!(parse_size("128.0"), Ok(128));
        assert!(parse_size("12.5").is_err());
        assert!(parse_size("-3").is_err());
    }
}
