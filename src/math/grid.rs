//! Evenly spaced evaluation grids.

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// `steps == 1` yields `[min]`; `steps == 0` yields an empty grid. The last point
/// is pinned to `max` exactly so shared domains line up across datasets.
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
            out[steps - 1] = max;
            out
        }
    }
}

/// Minimum and maximum of a slice, ignoring NaN. `None` for empty/all-NaN input.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        if v.is_nan() {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo <= hi { Some((lo, hi)) } else { None }
}
