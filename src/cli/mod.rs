//! Command-line parsing for the benchmark growth fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/rendering code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "perf", version, about = "Benchmark growth-curve fitter and plotter")]
pub struct Cli {
    /// Verbose logging (debug level unless `RUST_LOG` says otherwise).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every benchmark CSV in a directory, render figures, and print a summary.
    Analyze(AnalyzeArgs),
    /// Write synthetic benchmark CSVs for the classic algorithm names.
    Generate(GenerateArgs),
}

/// Options for the analysis pipeline.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Directory containing `<dataset>.csv` files.
    #[arg(long, env = "PERF_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory the PNG figures are written to.
    #[arg(long, env = "PERF_OUT_DIR", default_value = "plots")]
    pub out_dir: PathBuf,

    /// Maximum nonlinear solver iterations before falling back to the polynomial.
    #[arg(long, env = "PERF_MAX_ITERATIONS", default_value_t = 200)]
    pub max_iterations: usize,

    /// Analysis figure width (pixels).
    #[arg(long, default_value_t = 2100)]
    pub width: u32,

    /// Analysis figure height (pixels).
    #[arg(long, default_value_t = 1400)]
    pub height: u32,

    /// Fit and report only; do not render PNG figures.
    #[arg(long)]
    pub no_plots: bool,

    /// Export the fit summary to JSON.
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Export the fit summary to CSV.
    #[arg(long = "export-csv", value_name = "PATH")]
    pub export_csv: Option<PathBuf>,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Directory the CSV files are written to.
    #[arg(long, env = "PERF_DATA_DIR", default_value = "data")]
    pub out_dir: PathBuf,

    /// Smallest input size.
    #[arg(long, default_value_t = 100)]
    pub lower: u64,

    /// Largest input size (inclusive).
    #[arg(long, default_value_t = 5000)]
    pub upper: u64,

    /// Size increment.
    #[arg(long, default_value_t = 100)]
    pub step: u64,

    /// Simulated runs per size.
    #[arg(long, default_value_t = 10)]
    pub runs: usize,

    /// Relative Gaussian noise per run (0.05 = 5%).
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Random seed (combined with the algorithm name).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
