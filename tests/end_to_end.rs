//! End-to-end runs of the analysis pipeline over temporary data directories.

use std::fs;
use std::path::{Path, PathBuf};

use perf_curves::app::pipeline::run_analysis;
use perf_curves::domain::{AnalyzeConfig, FigureSize};
use perf_curves::io::read_fits_json;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

fn write_benchmark(dir: &Path, name: &str, law: impl Fn(f64) -> f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.01).unwrap();

    let mut body = String::from("n,t_mean,t_stdev,t_Q0,t_Q1,t_Q2,t_Q3,t_Q4\n");
    for i in 1..=20u64 {
        let n = i * 100;
        let t = law(n as f64) * (1.0 + noise.sample(&mut rng));
        let sd = t * 0.02;
        body.push_str(&format!(
            "{n},{t},{sd},{},{},{},{},{}\n",
            t - 2.0 * sd,
            t - sd,
            t,
            t + sd,
            t + 2.0 * sd
        ));
    }
    fs::write(dir.join(format!("{name}.csv")), body).unwrap();
}

fn standard_data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_benchmark(dir.path(), "divide_and_conquer", |n| 2.0 * n * n.log2().powi(2) + 500.0, 1);
    write_benchmark(dir.path(), "divide_and_conquer_improved", |n| 3.0 * n * n.log2() + 100.0, 2);
    write_benchmark(dir.path(), "linear_search", |n| 0.5 * n + 20.0, 3);
    dir
}

fn config(data_dir: &Path, out_dir: PathBuf) -> AnalyzeConfig {
    AnalyzeConfig {
        data_dir: data_dir.to_path_buf(),
        out_dir,
        render: false,
        analysis_size: FigureSize {
            width: 2100,
            height: 1400,
        },
        comparison_size: FigureSize {
            width: 1400,
            height: 2000,
        },
        max_iterations: 200,
        export_json: None,
        export_csv: None,
    }
}

#[test]
fn models_are_selected_by_dataset_name() {
    let data = standard_data_dir();
    let out = tempfile::tempdir().unwrap();

    let run = run_analysis(&config(data.path(), out.path().join("plots"))).unwrap();

    assert!(run.skipped.is_empty());
    let summary: Vec<(&str, &str)> = run
        .fits
        .iter()
        .map(|f| (f.name.as_str(), f.model_type.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("divide_and_conquer", "nlog²(n) fit"),
            ("divide_and_conquer_improved", "nlog(n) fit"),
            ("linear_search", "Polynomial fit"),
        ]
    );
    for f in &run.fits {
        assert!(!f.outcome.is_fallback(), "{} fell back", f.name);
        assert!(f.quality.r_squared > 0.99, "{} r²={}", f.name, f.quality.r_squared);
    }

    let cmp = run.comparison.expect("comparison");
    let labels = cmp.labels();
    assert_eq!(labels.len(), 3);
    for name in ["divide_and_conquer:", "divide_and_conquer_improved:", "linear_search:"] {
        assert!(labels.iter().any(|l| l.starts_with(name)), "missing {name}");
    }
    assert_eq!(cmp.y_max_with_buffer, cmp.y_max * 1.1);
}

#[test]
fn repeated_runs_are_identical() {
    let data = standard_data_dir();
    let out = tempfile::tempdir().unwrap();
    let cfg = config(data.path(), out.path().to_path_buf());

    let a = run_analysis(&cfg).unwrap();
    let b = run_analysis(&cfg).unwrap();

    let eq_a: Vec<&str> = a.fits.iter().map(|f| f.equation.as_str()).collect();
    let eq_b: Vec<&str> = b.fits.iter().map(|f| f.equation.as_str()).collect();
    assert_eq!(eq_a, eq_b);
    assert_eq!(a.comparison, b.comparison);
}

#[test]
fn broken_files_are_skipped_not_fatal() {
    let data = standard_data_dir();
    fs::write(data.path().join("aaa_broken.csv"), "n,t_mean\n1,2\n").unwrap();
    fs::write(data.path().join("zzz_one_row.csv"), "n,t_mean,t_stdev,t_Q0,t_Q1,t_Q2,t_Q3,t_Q4\n8,1,0,1,1,1,1,1\n").unwrap();
    let out = tempfile::tempdir().unwrap();

    let run = run_analysis(&config(data.path(), out.path().to_path_buf())).unwrap();

    assert_eq!(run.fits.len(), 3);
    assert_eq!(run.skipped.len(), 2);
    assert!(run.skipped[0].path.ends_with("aaa_broken.csv"));
    assert_eq!(run.comparison.map(|c| c.series.len()), Some(3));
}

#[test]
fn missing_directory_is_an_input_error() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(&root.path().join("does_not_exist"), root.path().join("plots"));

    let err = run_analysis(&cfg).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!root.path().join("plots").exists());
}

#[test]
fn directory_without_usable_data_yields_no_comparison() {
    let data = tempfile::tempdir().unwrap();
    fs::write(data.path().join("broken.csv"), "n,t_mean\n1,2\n").unwrap();
    let out = tempfile::tempdir().unwrap();

    let run = run_analysis(&config(data.path(), out.path().to_path_buf())).unwrap();
    assert!(run.fits.is_empty());
    assert!(run.comparison.is_none());
}

#[test]
fn summaries_are_exported() {
    let data = standard_data_dir();
    let out = tempfile::tempdir().unwrap();
    let mut cfg = config(data.path(), out.path().to_path_buf());
    cfg.export_json = Some(out.path().join("fits.json"));
    cfg.export_csv = Some(out.path().join("fits.csv"));

    let run = run_analysis(&cfg).unwrap();
    assert_eq!(run.written.len(), 2);

    let summary = read_fits_json(&out.path().join("fits.json")).unwrap();
    assert_eq!(summary.fits.len(), 3);
    assert_eq!(summary.fits[1].model_type, "nlog(n) fit");

    let csv_body = fs::read_to_string(out.path().join("fits.csv")).unwrap();
    assert_eq!(csv_body.lines().count(), 4);
}

fn rendering_config(data_dir: &Path, out_dir: PathBuf) -> AnalyzeConfig {
    let mut cfg = config(data_dir, out_dir);
    cfg.render = true;
    cfg.analysis_size = FigureSize {
        width: 900,
        height: 600,
    };
    cfg.comparison_size = FigureSize {
        width: 600,
        height: 900,
    };
    cfg
}

#[test]
fn figures_are_written_under_expected_names() {
    let data = standard_data_dir();
    let out = tempfile::tempdir().unwrap();
    let plots = out.path().join("plots");

    let run = run_analysis(&rendering_config(data.path(), plots.clone())).unwrap();

    assert!(run.skipped.is_empty(), "skipped: {:?}", run.skipped);
    for name in ["divide_and_conquer", "divide_and_conquer_improved", "linear_search"] {
        let png = plots.join(format!("{name}_analysis.png"));
        assert!(png.is_file(), "missing {}", png.display());
    }
    assert!(plots.join("combined_fit_curves.png").is_file());
    assert_eq!(run.written.len(), 4);
}

#[test]
fn render_failure_skips_that_dataset_only() {
    let data = standard_data_dir();
    let out = tempfile::tempdir().unwrap();
    let plots = out.path().join("plots");
    // A directory in place of the PNG makes that one figure unwritable.
    fs::create_dir_all(plots.join("linear_search_analysis.png")).unwrap();

    let run = run_analysis(&rendering_config(data.path(), plots.clone())).unwrap();

    let fitted: Vec<&str> = run.fits.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fitted, vec!["divide_and_conquer", "divide_and_conquer_improved"]);
    assert_eq!(run.skipped.len(), 1);
    assert!(run.skipped[0].path.ends_with("linear_search.csv"));

    let cmp = run.comparison.expect("comparison");
    let names: Vec<&str> = cmp.series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["divide_and_conquer", "divide_and_conquer_improved"]);
    assert!(plots.join("combined_fit_curves.png").is_file());
}
