//! Missing-aware reductions over rainfall samples.
//!
//! Missing values are NaN throughout. Each reduction documents whether it
//! skips missing samples or lets them propagate into the result.

/// Returns `true` if every sample is missing (vacuously true for empty input).
pub fn all_missing(samples: &[f32]) -> bool {
    samples.iter().all(|v| v.is_nan())
}

/// Number of non-missing samples.
pub fn count_present(samples: &[f32]) -> usize {
    samples.iter().filter(|v| !v.is_nan()).count()
}

/// Mean of the non-missing samples. NaN if none are present.
pub fn mean_skip(samples: &[f32]) -> f32 {
    mean_skip_min(samples, 1)
}

/// Mean of the non-missing samples, or NaN when fewer than `min_present`
/// samples are present. A `min_present` of zero behaves like one.
pub fn mean_skip_min(samples: &[f32], min_present: usize) -> f32 {
    let (sum, n) = samples
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0_usize), |(s, n), &v| (s + f64::from(v), n + 1));
    if n == 0 || n < min_present {
        return f32::NAN;
    }
    (sum / n as f64) as f32
}

/// Mean that propagates missing: NaN if any sample is missing or the
/// input is empty.
pub fn mean_propagate(samples: &[f32]) -> f32 {
    if samples.is_empty() || samples.iter().any(|v| v.is_nan()) {
        return f32::NAN;
    }
    let sum: f64 = samples.iter().map(|&v| f64::from(v)).sum();
    (sum / samples.len() as f64) as f32
}

/// Maximum of the non-missing samples. NaN if none are present.
pub fn max_skip(samples: &[f32]) -> f32 {
    samples
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
}

/// Index of the first maximum among non-missing samples, or `None` if
/// every sample is missing.
pub fn first_argmax(samples: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in samples.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the maximum that always yields an index.
///
/// Missing samples are never chosen while a present sample exists; ties
/// resolve to the earliest index. When every sample is missing (or the
/// input is empty) the result is `0`, so callers must mask those cases
/// separately with [`all_missing`].
pub fn blind_argmax(samples: &[f32]) -> usize {
    first_argmax(samples).unwrap_or(0)
}

/// Median of the non-missing samples. NaN if none are present.
///
/// For an even count, averages the middle two values.
pub fn median_skip(samples: &[f32]) -> f32 {
    let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f32::NAN;
    }
    sorted.sort_by(f32::total_cmp);
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
