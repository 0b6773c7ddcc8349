//! Boundary GeoJSON decoding.
//!
//! Both boundary datasets arrive as GeoJSON FeatureCollections. Features
//! are converted to geo-types multipolygons; non-polygonal features are
//! skipped with one aggregate warning. Property names come from the
//! configured field mapping and a missing property fails fast with
//! SchemaMismatch.

use crate::config::sources::NeighborhoodFields;
use crate::domain::model::{Municipality, Neighborhood};
use crate::utils::error::{MapError, Result};
use geo_types::{Geometry, MultiPolygon};
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonObject};

pub fn parse_neighborhoods(bytes: &[u8], fields: &NeighborhoodFields) -> Result<Vec<Neighborhood>> {
    let collection = feature_collection(bytes, "neighborhoods")?;
    let mut neighborhoods = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in collection.features {
        let Some(geometry) = multi_polygon(&feature) else {
            skipped += 1;
            continue;
        };
        let name = string_property(&feature.properties, &fields.name).ok_or_else(|| {
            MapError::SchemaMismatch {
                dataset: "neighborhoods".to_string(),
                field: fields.name.clone(),
            }
        })?;
        let municipality =
            string_property(&feature.properties, &fields.municipality).ok_or_else(|| {
                MapError::SchemaMismatch {
                    dataset: "neighborhoods".to_string(),
                    field: fields.municipality.clone(),
                }
            })?;
        let id = feature_id(&feature).unwrap_or_else(|| name.clone());

        neighborhoods.push(Neighborhood {
            id,
            name,
            municipality,
            geometry,
        });
    }

    if skipped > 0 {
        tracing::warn!(
            "skipped {} non-polygon feature(s) in the neighborhoods dataset",
            skipped
        );
    }

    Ok(neighborhoods)
}

pub fn parse_municipalities(bytes: &[u8], name_field: Option<&str>) -> Result<Vec<Municipality>> {
    let collection = feature_collection(bytes, "municipalities")?;
    let mut municipalities = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in collection.features {
        let Some(geometry) = multi_polygon(&feature) else {
            skipped += 1;
            continue;
        };
        let name = name_field.and_then(|f| string_property(&feature.properties, f));
        municipalities.push(Municipality { name, geometry });
    }

    if skipped > 0 {
        tracing::warn!(
            "skipped {} non-polygon feature(s) in the municipalities dataset",
            skipped
        );
    }

    Ok(municipalities)
}

fn feature_collection(bytes: &[u8], dataset: &str) -> Result<FeatureCollection> {
    let text = String::from_utf8_lossy(bytes);
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(MapError::UnexpectedGeoJson {
            dataset: dataset.to_string(),
        }),
    }
}

fn multi_polygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
    let geometry = feature.geometry.as_ref()?;
    match Geometry::<f64>::try_from(geometry.value.clone()) {
        Ok(Geometry::Polygon(polygon)) => Some(MultiPolygon(vec![polygon])),
        Ok(Geometry::MultiPolygon(multi)) => Some(multi),
        _ => None,
    }
}

fn string_property(properties: &Option<JsonObject>, key: &str) -> Option<String> {
    match properties.as_ref()?.get(key)? {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn feature_id(feature: &Feature) -> Option<String> {
    match feature.id.as_ref()? {
        Id::String(s) => Some(s.clone()),
        Id::Number(n) => Some(n.to_string()),
    }
}
