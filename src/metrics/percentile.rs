//! Nearest-rank percentile and mean helpers.

/// Nearest-rank percentile of `values` (in any order).
///
/// Sorts a copy ascending and returns the element at
/// `ceil(len * pct) - 1`, clamped to the valid index range. No interpolation
/// between neighbours. Returns `None` for an empty input.
///
/// ```rust
/// use ragchat::metrics::nearest_rank;
///
/// assert_eq!(nearest_rank(&[3.0, 1.0, 2.0], 0.5), Some(2.0));
/// assert_eq!(nearest_rank(&[], 0.95), None);
/// ```
pub fn nearest_rank(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (sorted.len() as f64 * pct).ceil() as i64 - 1;
    let index = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    Some(sorted[index])
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
