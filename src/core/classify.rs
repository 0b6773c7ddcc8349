//! Quantile classification for choropleth coloring.

/// Computes `classes - 1` break thresholds over the value set using the
/// quantile scheme: break `i` is the sorted value at rank `⌈i·n/k⌉`.
/// Fewer than `classes` distinct values simply produce duplicate breaks and
/// therefore fewer non-empty buckets. Empty input produces no breaks.
pub fn quantile_breaks(values: &[f64], classes: usize) -> Vec<f64> {
    if values.is_empty() || classes <= 1 {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    (1..classes)
        .map(|i| {
            let rank = (i * n).div_ceil(classes);
            sorted[rank - 1]
        })
        .collect()
}

/// Assigns a value to its bucket: the lowest bucket whose break is greater
/// than or equal to the value, so boundary values consistently fall in the
/// lower-indexed bucket.
pub fn bucket_for(value: f64, breaks: &[f64], classes: usize) -> usize {
    breaks
        .iter()
        .position(|b| value <= *b)
        .unwrap_or(classes.saturating_sub(1))
}
