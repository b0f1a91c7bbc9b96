//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - runs the analysis pipeline or the synthetic data generator
//! - prints the run summary

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, GenerateArgs};
use crate::domain::{AnalyzeConfig, FigureSize, GenerateConfig};
use crate::error::AppError;

pub mod pipeline;

/// Comparison figure size (two stacked panels).
const COMPARISON_SIZE: FigureSize = FigureSize {
    width: 1400,
    height: 2000,
};

/// Entry point for the `perf` binary.
pub fn run() -> Result<(), AppError> {
    // Environment defaults (`PERF_DATA_DIR`, ...) may live in `.env`.
    dotenvy::dotenv().ok();

    // We want `perf` and `perf --data-dir x` to behave like `perf analyze ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Generate(args) => handle_generate(&args),
    }
}

fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if verbose {
        filter = filter.add_directive(tracing::Level::DEBUG.into());
    }
    // Ignored when a subscriber is already installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let config = analyze_config_from_args(args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run.fits, &run.skipped));

    for path in &run.written {
        info!(path = %path.display(), "Wrote");
    }
    Ok(())
}

fn handle_generate(args: &GenerateArgs) -> Result<(), AppError> {
    let config = generate_config_from_args(args);
    let written = crate::data::generate_all(&config)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

pub fn analyze_config_from_args(args: &AnalyzeArgs) -> Result<AnalyzeConfig, AppError> {
    if args.width == 0 || args.height == 0 {
        return Err(AppError::new(2, "Figure width and height must be > 0."));
    }

    Ok(AnalyzeConfig {
        data_dir: args.data_dir.clone(),
        out_dir: args.out_dir.clone(),
        render: !args.no_plots,
        analysis_size: FigureSize {
            width: args.width,
            height: args.height,
        },
        comparison_size: COMPARISON_SIZE,
        max_iterations: args.max_iterations,
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
    })
}

pub fn generate_config_from_args(args: &GenerateArgs) -> GenerateConfig {
    GenerateConfig {
        out_dir: args.out_dir.clone(),
        lower: args.lower,
        upper: args.upper,
        step: args.step,
        runs: args.runs,
        noise: args.noise,
        seed: args.seed,
    }
}

/// Rewrite argv so `perf` defaults to `perf analyze`.
///
/// Rules:
/// - `perf`                        -> `perf analyze`
/// - `perf --data-dir x ...`       -> `perf analyze --data-dir x ...`
/// - `perf --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "generate");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "analyze flags".
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
