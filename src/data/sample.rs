//! Synthetic benchmark generation.
//!
//! Each algorithm is simulated by evaluating its growth law at every size,
//! perturbing `runs` repetitions with relative Gaussian noise, and reducing the
//! repetitions to the same row statistics the ingest schema expects.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::{debug, info};

use crate::domain::{BenchSample, Dataset, GenerateConfig, QUANTILE_COUNT};
use crate::error::AppError;
use crate::io::export::write_dataset_csv;

/// Simulated cost of one unit of work, in nanoseconds.
const NS_PER_OP: f64 = 1.5;

/// Growth law used to simulate an algorithm's running time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthLaw {
    /// `n²`
    Quadratic,
    /// `n²/2`
    HalfQuadratic,
    /// `n·log2(n)²`
    NLogNSquared,
    /// `n·log2(n)`
    NLogN,
}

impl GrowthLaw {
    /// Operation count for input size `n`.
    pub fn ops(self, n: u64) -> f64 {
        let n = n as f64;
        match self {
            GrowthLaw::Quadratic => n * n,
            GrowthLaw::HalfQuadratic => n * n / 2.0,
            GrowthLaw::NLogNSquared => n * n.log2().powi(2),
            GrowthLaw::NLogN => n * n.log2(),
        }
    }
}

/// The algorithms written by `perf generate`.
pub const DEFAULT_ALGORITHMS: &[(&str, GrowthLaw)] = &[
    ("brute_force", GrowthLaw::Quadratic),
    ("brute_force_improved", GrowthLaw::HalfQuadratic),
    ("divide_and_conquer", GrowthLaw::NLogNSquared),
    ("divide_and_conquer_improved", GrowthLaw::NLogN),
];

/// Row statistics over repeated timings of one size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub mean: f64,
    /// Unbiased (n - 1) sample standard deviation.
    pub stdev: f64,
    /// Q0 (min), Q1, Q2, Q3, Q4 (max), linearly interpolated.
    pub quantiles: [f64; QUANTILE_COUNT],
}

/// Reduce repeated timings to mean, stdev and quartiles.
///
/// Returns `None` for fewer than two runs or any non-finite timing.
pub fn summarize_runs(runs: &[f64]) -> Option<RunStats> {
    if runs.len() < 2 || runs.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let n = runs.len() as f64;
    let mean = runs.iter().sum::<f64>() / n;
    let var = runs.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    let mut sorted = runs.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut quantiles = [0.0; QUANTILE_COUNT];
    for (i, q) in quantiles.iter_mut().enumerate() {
        *q = interpolated_quantile(&sorted, i as f64 / (QUANTILE_COUNT - 1) as f64);
    }

    Some(RunStats {
        mean,
        stdev: var.sqrt(),
        quantiles,
    })
}

fn interpolated_quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Simulate one algorithm over the configured size range.
pub fn generate_dataset(name: &str, law: GrowthLaw, config: &GenerateConfig) -> Result<Dataset, AppError> {
    validate_config(config)?;

    let mut rng = StdRng::seed_from_u64(dataset_seed(config.seed, name));
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut samples = Vec::new();
    let mut runs = Vec::with_capacity(config.runs);

    for n in sizes(config) {
        let base = law.ops(n) * NS_PER_OP;

        runs.clear();
        for _ in 0..config.runs {
            let z: f64 = normal.sample(&mut rng);
            runs.push((base * (1.0 + z)).max(0.0));
        }

        let stats = summarize_runs(&runs)
            .ok_or_else(|| AppError::new(4, format!("Failed to summarize runs for '{name}' at n={n}.")))?;

        samples.push(BenchSample {
            n,
            t_mean: stats.mean,
            t_stdev: stats.stdev,
            quantiles: stats.quantiles,
        });
    }

    Dataset::new(name, samples)
}

/// Write every default algorithm as `<out_dir>/<name>.csv`.
pub fn generate_all(config: &GenerateConfig) -> Result<Vec<PathBuf>, AppError> {
    validate_config(config)?;

    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(5, format!("Failed to create output directory '{}': {e}", config.out_dir.display()))
    })?;

    let mut written = Vec::with_capacity(DEFAULT_ALGORITHMS.len());
    for &(name, law) in DEFAULT_ALGORITHMS {
        let dataset = generate_dataset(name, law, config)?;
        let path = config.out_dir.join(format!("{name}.csv"));
        write_dataset_csv(&path, dataset.samples())?;
        debug!(dataset = name, rows = dataset.samples().len(), "generated dataset");
        written.push(path);
    }

    info!(
        out_dir = %config.out_dir.display(),
        files = written.len(),
        "Synthetic benchmarks written"
    );
    Ok(written)
}

fn validate_config(config: &GenerateConfig) -> Result<(), AppError> {
    if config.lower == 0 {
        return Err(AppError::new(2, "Lower size bound must be > 0."));
    }
    if config.step == 0 {
        return Err(AppError::new(2, "Size step must be > 0."));
    }
    if config.upper < config.lower {
        return Err(AppError::new(
            2,
            format!("Invalid size range: upper ({}) < lower ({}).", config.upper, config.lower),
        ));
    }
    if sizes(config).nth(1).is_none() {
        return Err(AppError::new(2, "Size range must contain at least 2 sizes."));
    }
    if config.runs < 2 {
        return Err(AppError::new(2, "Runs per size must be >= 2."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise level must be a finite value >= 0."));
    }
    Ok(())
}

fn sizes(config: &GenerateConfig) -> impl Iterator<Item = u64> {
    let step = usize::try_from(config.step).unwrap_or(usize::MAX).max(1);
    (config.lower..=config.upper).step_by(step)
}

fn dataset_seed(seed: u64, name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    name.hash(&mut hasher);
    hasher.finish()
}
