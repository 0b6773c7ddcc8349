use geo_types::MultiPolygon;
use serde::Serialize;
use std::sync::Arc;

/// One raw listing row. Unparseable or absent cells stay `None`; filtering
/// happens in the pipeline, not at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub category: Option<String>,
    pub price: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A listing that survived filtering: finite coordinates and a finite price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredListing {
    pub lon: f64,
    pub lat: f64,
    pub price: f64,
}

/// One member of the fine boundary partition used for coloring.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    pub id: String,
    pub name: String,
    pub municipality: String,
    pub geometry: MultiPolygon<f64>,
}

/// One member of the coarse outline layer drawn over the whole region.
#[derive(Debug, Clone)]
pub struct Municipality {
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// Everything the extract stage hands to the transform stage. The boundary
/// collections are shared so the output layers can reference them without
/// copying, and so the spatial index cache can key off a stable dataset.
#[derive(Debug, Clone)]
pub struct SourceData {
    pub listings: Vec<ListingRecord>,
    pub neighborhoods: Arc<Vec<Neighborhood>>,
    pub municipalities: Arc<Vec<Municipality>>,
}

/// A listing joined to its enclosing neighborhood (index into the partition).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedListing {
    pub neighborhood: usize,
    pub price: f64,
}

/// Mean price for one neighborhood with at least one contributing listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborhoodStats {
    pub neighborhood: usize,
    /// Rounded to two decimals; the running sum keeps full precision.
    pub mean_price: f64,
    pub listings: usize,
}

/// A neighborhood carrying its classified mean, ready for rendering.
/// Built once per run and never mutated.
#[derive(Debug, Clone)]
pub struct ClassifiedNeighborhood {
    pub id: String,
    pub name: String,
    pub municipality: String,
    pub mean_price: f64,
    pub price_display: String,
    pub bucket: usize,
    pub geometry: MultiPolygon<f64>,
}

/// Transform output: the classified subset plus the two unmodified boundary
/// collections, kept as separate layers so "neighborhoods without data are
/// not colored" is explicit rather than a side effect of a merge.
#[derive(Debug, Clone)]
pub struct MapLayers {
    pub category: String,
    pub classified: Vec<ClassifiedNeighborhood>,
    pub breaks: Vec<f64>,
    pub neighborhoods: Arc<Vec<Neighborhood>>,
    pub municipalities: Arc<Vec<Municipality>>,
    pub summary: RunSummary,
}

/// Counters for the display text and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub category: String,
    pub total_listings: usize,
    pub filtered: usize,
    pub joined: usize,
    pub unjoined: usize,
    pub ambiguous: usize,
    pub skipped_polygons: usize,
    pub classified: usize,
}

/// Formats a price the way the map tooltip shows it: `$1,234.56`.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let grouped: Vec<String> = whole
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();

    format!(
        "{}${}.{:02}",
        if negative { "-" } else { "" },
        grouped.join(","),
        fraction
    )
}
