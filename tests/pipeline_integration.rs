//! End-to-end properties of the choropleth pipeline over a synthetic
//! partition: a row of unit squares with shared edges.

use geo_types::{LineString, MultiPolygon, Point, Polygon};
use renta_map::core::index::GeometryIndex;
use renta_map::core::join::{Containment, ContainmentJoiner};
use renta_map::domain::model::{ListingRecord, Municipality, Neighborhood, SourceData};
use renta_map::ChoroplethPipeline;
use std::sync::Arc;

fn square(id: &str, x: f64) -> Neighborhood {
    let exterior = LineString::from(vec![
        (x, 0.0),
        (x + 1.0, 0.0),
        (x + 1.0, 1.0),
        (x, 1.0),
        (x, 0.0),
    ]);
    Neighborhood {
        id: id.to_string(),
        name: id.to_string(),
        municipality: "Monterrey".to_string(),
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

/// Eight squares side by side, one listing per square priced 10..80.
fn eight_square_data() -> SourceData {
    let neighborhoods: Vec<Neighborhood> = (0..8)
        .map(|i| square(&format!("n{}", i), i as f64))
        .collect();
    let listings: Vec<ListingRecord> = (0..8)
        .map(|i| listing("casa", i as f64 + 0.5, 0.5, (i as f64 + 1.0) * 10.0))
        .collect();

    SourceData {
        listings,
        neighborhoods: Arc::new(neighborhoods),
        municipalities: Arc::new(Vec::<Municipality>::new()),
    }
}

#[test]
fn classified_neighborhoods_contain_their_listings() {
    let data = eight_square_data();
    let index = GeometryIndex::build(&data.neighborhoods);
    let joiner = ContainmentJoiner::new(&index, &data.neighborhoods);

    use geo::Contains;
    for l in &data.listings {
        let (lon, lat) = (l.lon.unwrap(), l.lat.unwrap());
        if let Containment::Inside(idx) = joiner.locate(lon, lat) {
            let point = Point::new(lon, lat);
            assert!(
                data.neighborhoods[idx].geometry.contains(&point),
                "join result must be confirmed by the exact predicate"
            );
        } else {
            panic!("every synthetic listing sits strictly inside one square");
        }
    }
}

#[test]
fn quantile_buckets_split_the_partition_evenly() {
    let data = eight_square_data();
    let pipeline = ChoroplethPipeline::new(4);
    let layers = pipeline.run(&data, "casa");

    assert_eq!(layers.classified.len(), 8);
    // Breaks at ranks 2, 4, 6 of the sorted means.
    assert_eq!(layers.breaks, vec![20.0, 40.0, 60.0]);

    let mut counts = [0usize; 4];
    for c in &layers.classified {
        counts[c.bucket] += 1;
    }
    assert_eq!(counts, [2, 2, 2, 2]);
}

#[test]
fn listing_on_a_shared_edge_is_never_double_counted() {
    let mut data = eight_square_data();
    // Exactly on the edge between n0 and n1.
    data.listings.push(listing("casa", 1.0, 0.5, 1_000_000.0));

    let pipeline = ChoroplethPipeline::new(4);
    let layers = pipeline.run(&data, "casa");

    // The edge listing joined nothing: every mean is unchanged.
    assert_eq!(layers.summary.unjoined, 1);
    let total: f64 = layers
        .classified
        .iter()
        .map(|c| c.mean_price)
        .sum();
    assert_eq!(total, (1..=8).map(|i| (i * 10) as f64).sum::<f64>());
}

#[test]
fn empty_category_produces_empty_layers_not_an_error() {
    let data = eight_square_data();
    let pipeline = ChoroplethPipeline::new(4);
    let layers = pipeline.run(&data, "bodega");

    assert!(layers.classified.is_empty());
    assert!(layers.breaks.is_empty());
    assert_eq!(layers.summary.filtered, 0);
    assert_eq!(layers.neighborhoods.len(), 8);
}

#[test]
fn repeated_runs_are_identical() {
    let data = eight_square_data();
    let pipeline = ChoroplethPipeline::new(4);

    let first = pipeline.run(&data, "casa");
    let second = pipeline.run(&data, "casa");

    assert_eq!(first.summary, second.summary);
    assert_eq!(first.breaks, second.breaks);
    let snapshot = |layers: &renta_map::core::MapLayers| -> Vec<(String, String, usize)> {
        let mut rows: Vec<_> = layers
            .classified
            .iter()
            .map(|c| (c.id.clone(), c.price_display.clone(), c.bucket))
            .collect();
        rows.sort();
        rows
    };
    assert_eq!(snapshot(&first), snapshot(&second));
}

#[test]
fn unjoined_and_offgrid_listings_are_excluded() {
    let mut data = eight_square_data();
    data.listings.push(listing("casa", 50.0, 50.0, 999.0));
    data.listings.push(ListingRecord {
        category: Some("casa".to_string()),
        price: Some(100.0),
        lat: None,
        lon: Some(0.5),
    });

    let pipeline = ChoroplethPipeline::new(4);
    let layers = pipeline.run(&data, "casa");

    assert_eq!(layers.summary.filtered, 9);
    assert_eq!(layers.summary.joined, 8);
    assert_eq!(layers.summary.unjoined, 1);
}
