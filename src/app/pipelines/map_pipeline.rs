use crate::adapters::boundaries::{parse_municipalities, parse_neighborhoods};
use crate::adapters::http::DatasetFetcher;
use crate::adapters::listings::parse_listings;
use crate::adapters::render;
use crate::core::pipeline::ChoroplethPipeline;
use crate::core::{ConfigProvider, MapLayers, Pipeline, SourceData, Storage};
use crate::utils::error::{MapError, Result};
use std::sync::Arc;

pub const CHOROPLETH_FILE: &str = "choropleth.geojson";
pub const NEIGHBORHOODS_FILE: &str = "neighborhoods.geojson";
pub const MUNICIPALITIES_FILE: &str = "municipalities.geojson";
pub const SUMMARY_FILE: &str = "summary.json";

/// Fetches the three datasets, runs the choropleth pipeline for the
/// configured category and writes the render-ready layers.
pub struct MapPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: DatasetFetcher,
    choropleth: ChoroplethPipeline,
}

impl<S: Storage, C: ConfigProvider> MapPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let choropleth = ChoroplethPipeline::new(config.classes());
        Self {
            storage,
            config,
            fetcher: DatasetFetcher::new(),
            choropleth,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MapPipeline<S, C> {
    async fn extract(&self) -> Result<SourceData> {
        let sources = self.config.sources();

        let listing_bytes = self.fetcher.fetch_bytes(&sources.listings.url).await?;
        let listings = parse_listings(&listing_bytes, &sources.listings.fields)?;
        tracing::debug!("parsed {} listing rows", listings.len());

        let boundary_bytes = self.fetcher.fetch_bytes(&sources.neighborhoods.url).await?;
        let neighborhoods = parse_neighborhoods(&boundary_bytes, &sources.neighborhoods.fields)?;
        tracing::debug!("parsed {} neighborhood boundaries", neighborhoods.len());

        let outline_bytes = self.fetcher.fetch_bytes(&sources.municipalities.url).await?;
        let municipalities = parse_municipalities(
            &outline_bytes,
            sources.municipalities.name_field.as_deref(),
        )?;
        tracing::debug!("parsed {} municipal outlines", municipalities.len());

        Ok(SourceData {
            listings,
            neighborhoods: Arc::new(neighborhoods),
            municipalities: Arc::new(municipalities),
        })
    }

    async fn transform(&self, data: SourceData) -> Result<MapLayers> {
        let category = self.config.category().ok_or_else(|| MapError::ConfigError {
            message: "no housing category selected".to_string(),
        })?;
        Ok(self.choropleth.run(&data, category))
    }

    async fn load(&self, layers: MapLayers) -> Result<String> {
        let choropleth = serde_json::to_string(&render::choropleth_layer(&layers))?;
        self.storage
            .write_file(CHOROPLETH_FILE, choropleth.as_bytes())
            .await?;

        let outlines = serde_json::to_string(&render::neighborhood_layer(&layers.neighborhoods))?;
        self.storage
            .write_file(NEIGHBORHOODS_FILE, outlines.as_bytes())
            .await?;

        let municipalities =
            serde_json::to_string(&render::municipality_layer(&layers.municipalities))?;
        self.storage
            .write_file(MUNICIPALITIES_FILE, municipalities.as_bytes())
            .await?;

        let summary = serde_json::to_string_pretty(&render::summary_document(&layers))?;
        self.storage
            .write_file(SUMMARY_FILE, summary.as_bytes())
            .await?;

        Ok(self.config.output_path().to_string())
    }
}
