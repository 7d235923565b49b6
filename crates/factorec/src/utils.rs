//! Common utilities used across the crate.
//!
//! Guarded statistics for round bookkeeping and worker-count resolution for
//! the task harness.

// =============================================================================
// Statistical Utilities
// =============================================================================

/// `num / den`, or `0.0` when `den` is zero.
#[inline]
pub fn guarded_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Root mean of an accumulated squared error over `count` observations.
///
/// Returns `0.0` for an empty set instead of `NaN`.
#[inline]
pub fn guarded_rmse(sum_sq: f64, count: usize) -> f64 {
    guarded_div(sum_sq, count as f64).sqrt()
}

// =============================================================================
// Worker Pool Sizing
// =============================================================================

/// Resolve a requested worker count.
///
/// - `0` = auto (one worker per available core)
/// - `n > 0` = exactly `n` workers
#[inline]
pub fn resolve_workers(n_workers: usize) -> usize {
    if n_workers > 0 {
        return n_workers;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
