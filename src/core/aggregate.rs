//! Mean price per neighborhood.

use crate::domain::model::{JoinedListing, NeighborhoodStats};
use std::collections::HashMap;

/// Groups joined listings by neighborhood and computes the mean price.
/// Neighborhoods with no contributing listing are absent, not zero-valued.
/// The sum keeps full precision; only the resulting mean is rounded to two
/// decimals. Output is sorted by neighborhood index so downstream layers
/// are deterministic.
pub fn mean_price_by_neighborhood(joined: &[JoinedListing]) -> Vec<NeighborhoodStats> {
    let mut groups: HashMap<usize, (f64, usize)> = HashMap::new();
    for listing in joined {
        let entry = groups.entry(listing.neighborhood).or_insert((0.0, 0));
        entry.0 += listing.price;
        entry.1 += 1;
    }

    let mut stats: Vec<NeighborhoodStats> = groups
        .into_iter()
        .map(|(neighborhood, (sum, count))| NeighborhoodStats {
            neighborhood,
            mean_price: round2(sum / count as f64),
            listings: count,
        })
        .collect();
    stats.sort_by_key(|s| s.neighborhood);
    stats
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
