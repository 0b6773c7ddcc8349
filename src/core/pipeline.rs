//! The choropleth pipeline: filter, join, aggregate, classify, emit layers.
//!
//! Every stage is a pure transformation over in-memory data; a run never
//! fails, it degrades to empty layers. The only state carried across runs
//! is the spatial index cache, keyed by a fingerprint of the boundary
//! dataset so a category change reuses the index while a dataset change
//! rebuilds it.

use crate::core::aggregate::mean_price_by_neighborhood;
use crate::core::classify::{bucket_for, quantile_breaks};
use crate::core::index::GeometryIndex;
use crate::core::join::ContainmentJoiner;
use crate::domain::model::{
    format_currency, ClassifiedNeighborhood, FilteredListing, ListingRecord, MapLayers,
    Neighborhood, RunSummary, SourceData,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

struct CachedIndex {
    fingerprint: u64,
    index: Arc<GeometryIndex>,
}

pub struct ChoroplethPipeline {
    classes: usize,
    index_cache: Mutex<Option<CachedIndex>>,
}

impl ChoroplethPipeline {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            index_cache: Mutex::new(None),
        }
    }

    /// Runs the full pipeline for one category selection.
    pub fn run(&self, data: &SourceData, category: &str) -> MapLayers {
        let filtered = filter_listings(&data.listings, category);
        tracing::debug!(
            "category `{}`: {} of {} listings selected",
            category,
            filtered.len(),
            data.listings.len()
        );

        let index = self.index_for(&data.neighborhoods);
        let joiner = ContainmentJoiner::new(&index, &data.neighborhoods);
        let (joined, join_stats) = joiner.join_all(&filtered);

        let stats = mean_price_by_neighborhood(&joined);
        let means: Vec<f64> = stats.iter().map(|s| s.mean_price).collect();
        let breaks = quantile_breaks(&means, self.classes);

        // Explicit merge of aggregates onto boundary attributes. Only
        // neighborhoods with data appear here; the full partition ships
        // separately as the outline layer.
        let classified: Vec<ClassifiedNeighborhood> = stats
            .iter()
            .map(|s| {
                let neighborhood = &data.neighborhoods[s.neighborhood];
                ClassifiedNeighborhood {
                    id: neighborhood.id.clone(),
                    name: neighborhood.name.clone(),
                    municipality: neighborhood.municipality.clone(),
                    mean_price: s.mean_price,
                    price_display: format_currency(s.mean_price),
                    bucket: bucket_for(s.mean_price, &breaks, self.classes),
                    geometry: neighborhood.geometry.clone(),
                }
            })
            .collect();

        if classified.is_empty() {
            tracing::info!("category `{}` produced no classified neighborhoods", category);
        }

        let summary = RunSummary {
            category: category.to_string(),
            total_listings: data.listings.len(),
            filtered: filtered.len(),
            joined: join_stats.joined,
            unjoined: join_stats.unjoined,
            ambiguous: join_stats.ambiguous,
            skipped_polygons: index.skipped(),
            classified: classified.len(),
        };

        MapLayers {
            category: category.to_string(),
            classified,
            breaks,
            neighborhoods: Arc::clone(&data.neighborhoods),
            municipalities: Arc::clone(&data.municipalities),
            summary,
        }
    }

    /// Returns the cached index when the boundary dataset is unchanged,
    /// otherwise builds and caches a fresh one.
    fn index_for(&self, neighborhoods: &Arc<Vec<Neighborhood>>) -> Arc<GeometryIndex> {
        let fingerprint = dataset_fingerprint(neighborhoods);

        if let Ok(mut cache) = self.index_cache.lock() {
            if let Some(cached) = cache.as_ref() {
                if cached.fingerprint == fingerprint {
                    tracing::debug!("reusing cached spatial index");
                    return Arc::clone(&cached.index);
                }
            }
            let index = Arc::new(GeometryIndex::build(neighborhoods));
            *cache = Some(CachedIndex {
                fingerprint,
                index: Arc::clone(&index),
            });
            return index;
        }

        // Poisoned lock: fall back to an uncached build.
        Arc::new(GeometryIndex::build(neighborhoods))
    }
}

/// Keeps listings in the selected category with finite coordinates and a
/// finite price; everything else is excluded before the join.
fn filter_listings(listings: &[ListingRecord], category: &str) -> Vec<FilteredListing> {
    listings
        .iter()
        .filter_map(|l| match (&l.category, l.lon, l.lat, l.price) {
            (Some(c), Some(lon), Some(lat), Some(price))
                if c == category && lon.is_finite() && lat.is_finite() && price.is_finite() =>
            {
                Some(FilteredListing { lon, lat, price })
            }
            _ => None,
        })
        .collect()
}

/// Distinct listing categories, sorted, for the selector surface.
pub fn available_categories(listings: &[ListingRecord]) -> Vec<String> {
    let mut categories: Vec<String> = listings
        .iter()
        .filter_map(|l| l.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

/// Identity of a boundary dataset, used as the index cache key.
pub fn dataset_fingerprint(neighborhoods: &[Neighborhood]) -> u64 {
    let mut hasher = DefaultHasher::new();
    neighborhoods.len().hash(&mut hasher);
    for n in neighborhoods {
        n.id.hash(&mut hasher);
        for polygon in &n.geometry.0 {
            polygon.exterior().0.len().hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Municipality;
    use geo_types::{LineString, MultiPolygon, Polygon};

    fn square(id: &str, x: f64, y: f64, size: f64) -> Neighborhood {
        let exterior = LineString::from(vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ]);
        Neighborhood {
            id: id.to_string(),
            name: id.to_string(),
            municipality: "Test".to_string(),
            geometry: MultiPolygon(vec![Polygon::new(exterior, vec![])]),
        }
    }

    fn listing(category: &str, lon: f64, lat: f64, price: f64) -> ListingRecord {
        ListingRecord {
            category: Some(category.to_string()),
            price: Some(price),
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    fn source_data() -> SourceData {
        SourceData {
            listings: vec![
                listing("casa", 0.5, 0.5, 100.0),
                listing("casa", 0.6, 0.4, 200.0),
                listing("casa", 1.5, 0.5, 300.0),
                listing("departamento", 0.5, 0.5, 900.0),
            ],
            neighborhoods: Arc::new(vec![
                square("a", 0.0, 0.0, 1.0),
                square("b", 1.0, 0.0, 1.0),
                square("empty", 2.0, 0.0, 1.0),
            ]),
            municipalities: Arc::new(Vec::<Municipality>::new()),
        }
    }

    #[test]
    fn test_category_with_no_listings_yields_empty_layers() {
        let pipeline = ChoroplethPipeline::new(5);
        let layers = pipeline.run(&source_data(), "oficina");

        assert!(layers.classified.is_empty());
        assert!(layers.breaks.is_empty());
        assert_eq!(layers.summary.filtered, 0);
        assert_eq!(layers.summary.classified, 0);
        // The outline layers still carry the full partition.
        assert_eq!(layers.neighborhoods.len(), 3);
    }

    #[test]
    fn test_neighborhoods_without_data_are_dropped_from_coloring() {
        let pipeline = ChoroplethPipeline::new(5);
        let layers = pipeline.run(&source_data(), "casa");

        let ids: Vec<&str> = layers.classified.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(layers.neighborhoods.len(), 3);
    }

    #[test]
    fn test_merge_preserves_aggregate_means_exactly() {
        let pipeline = ChoroplethPipeline::new(5);
        let layers = pipeline.run(&source_data(), "casa");

        let by_id: std::collections::HashMap<&str, f64> = layers
            .classified
            .iter()
            .map(|c| (c.id.as_str(), c.mean_price))
            .collect();
        assert_eq!(by_id["a"], 150.00);
        assert_eq!(by_id["b"], 300.00);
        assert_eq!(by_id["a"], layers.classified[0].mean_price);
    }

    #[test]
    fn test_records_with_missing_fields_are_filtered() {
        let mut data = source_data();
        data.listings.push(ListingRecord {
            category: Some("casa".to_string()),
            price: None,
            lat: Some(0.5),
            lon: Some(0.5),
        });
        data.listings.push(ListingRecord {
            category: Some("casa".to_string()),
            price: Some(f64::NAN),
            lat: Some(0.5),
            lon: Some(0.5),
        });
        data.listings.push(ListingRecord {
            category: Some("casa".to_string()),
            price: Some(100.0),
            lat: None,
            lon: Some(0.5),
        });

        let pipeline = ChoroplethPipeline::new(5);
        let layers = pipeline.run(&data, "casa");
        assert_eq!(layers.summary.filtered, 3);
    }

    #[test]
    fn test_runs_are_idempotent() {
        let pipeline = ChoroplethPipeline::new(5);
        let data = source_data();

        let first = pipeline.run(&data, "casa");
        let second = pipeline.run(&data, "casa");

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.breaks, second.breaks);
        assert_eq!(first.classified.len(), second.classified.len());
        for (a, b) in first.classified.iter().zip(second.classified.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.mean_price, b.mean_price);
            assert_eq!(a.bucket, b.bucket);
            assert_eq!(a.price_display, b.price_display);
        }
    }

    #[test]
    fn test_index_cache_keyed_by_dataset_identity() {
        let data = source_data();
        let fp1 = dataset_fingerprint(&data.neighborhoods);
        let fp2 = dataset_fingerprint(&data.neighborhoods);
        assert_eq!(fp1, fp2);

        let other = vec![square("x", 0.0, 0.0, 1.0)];
        assert_ne!(fp1, dataset_fingerprint(&other));
    }

    #[test]
    fn test_available_categories_sorted_distinct() {
        let data = source_data();
        assert_eq!(
            available_categories(&data.listings),
            vec!["casa".to_string(), "departamento".to_string()]
        );
    }
}
