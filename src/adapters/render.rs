//! GeoJSON layer emission for the external map renderer.

use crate::domain::model::{MapLayers, Municipality, Neighborhood, RunSummary};
use chrono::{DateTime, Utc};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::Serialize;
use serde_json::Value;

/// The colored layer: one feature per classified neighborhood, carrying
/// everything the tooltip and the color scale need.
pub fn choropleth_layer(layers: &MapLayers) -> FeatureCollection {
    let features = layers
        .classified
        .iter()
        .map(|c| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), Value::String(c.name.clone()));
            properties.insert(
                "municipality".to_string(),
                Value::String(c.municipality.clone()),
            );
            properties.insert("mean_price".to_string(), Value::from(c.mean_price));
            properties.insert(
                "price_display".to_string(),
                Value::String(c.price_display.clone()),
            );
            properties.insert("bucket".to_string(), Value::from(c.bucket as u64));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::from(&c.geometry))),
                id: Some(Id::String(c.id.clone())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// The full partition as an outline-only layer, uncolored.
pub fn neighborhood_layer(neighborhoods: &[Neighborhood]) -> FeatureCollection {
    let features = neighborhoods
        .iter()
        .map(|n| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), Value::String(n.name.clone()));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::from(&n.geometry))),
                id: Some(Id::String(n.id.clone())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// The coarse region outline layer.
pub fn municipality_layer(municipalities: &[Municipality]) -> FeatureCollection {
    let features = municipalities
        .iter()
        .map(|m| {
            let mut properties = JsonObject::new();
            if let Some(name) = &m.name {
                properties.insert("name".to_string(), Value::String(name.clone()));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::from(&m.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Run metadata written next to the layers: counters for the "N records
/// found" display text plus the class breaks for the legend.
#[derive(Debug, Serialize)]
pub struct SummaryDocument {
    pub generated_at: DateTime<Utc>,
    pub breaks: Vec<f64>,
    #[serde(flatten)]
    pub summary: RunSummary,
}

pub fn summary_document(layers: &MapLayers) -> SummaryDocument {
    SummaryDocument {
        generated_at: Utc::now(),
        breaks: layers.breaks.clone(),
        summary: layers.summary.clone(),
    }
}
