//! Dataset source definitions, loadable from a TOML file.
//!
//! Each source names an HTTP endpoint and the field mapping used to pull
//! typed records out of it. The mapping is resolved once at the ingestion
//! boundary; a missing column or property fails fast with SchemaMismatch
//! instead of surfacing deep inside the pipeline.

use crate::utils::error::{MapError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_LISTINGS_URL: &str =
    "https://github.com/claudiodanielpc/vivi_zmmty/raw/refs/heads/main/scripts/vivi_renta.csv";
const DEFAULT_NEIGHBORHOODS_URL: &str =
    "https://raw.githubusercontent.com/claudiodanielpc/vivi_zmmty/refs/heads/main/colonias_zmmty.geojson";
const DEFAULT_MUNICIPALITIES_URL: &str =
    "https://raw.githubusercontent.com/claudiodanielpc/vivi_zmmty/refs/heads/main/zmmty.geojson";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub listings: ListingSource,
    pub neighborhoods: BoundarySource,
    pub municipalities: OutlineSource,
}

/// The listings CSV endpoint and its column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSource {
    pub url: String,
    #[serde(default)]
    pub fields: ListingFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingFields {
    #[serde(default = "default_category_field")]
    pub category: String,
    #[serde(default = "default_price_field")]
    pub price: String,
    #[serde(default = "default_lat_field")]
    pub lat: String,
    #[serde(default = "default_lon_field")]
    pub lon: String,
}

/// The fine boundary partition endpoint and its property names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySource {
    pub url: String,
    #[serde(default)]
    pub fields: NeighborhoodFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodFields {
    #[serde(default = "default_name_field")]
    pub name: String,
    #[serde(default = "default_municipality_field")]
    pub municipality: String,
}

/// The coarse outline endpoint. The name property is optional; outlines
/// render without labels when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSource {
    pub url: String,
    #[serde(default)]
    pub name_field: Option<String>,
}

fn default_category_field() -> String {
    "tipo_vivi".to_string()
}

fn default_price_field() -> String {
    "precio".to_string()
}

fn default_lat_field() -> String {
    "lat".to_string()
}

fn default_lon_field() -> String {
    "lon".to_string()
}

fn default_name_field() -> String {
    "nom_colonia".to_string()
}

fn default_municipality_field() -> String {
    "nom_mun".to_string()
}

impl Default for ListingFields {
    fn default() -> Self {
        Self {
            category: default_category_field(),
            price: default_price_field(),
            lat: default_lat_field(),
            lon: default_lon_field(),
        }
    }
}

impl Default for NeighborhoodFields {
    fn default() -> Self {
        Self {
            name: default_name_field(),
            municipality: default_municipality_field(),
        }
    }
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            listings: ListingSource {
                url: DEFAULT_LISTINGS_URL.to_string(),
                fields: ListingFields::default(),
            },
            neighborhoods: BoundarySource {
                url: DEFAULT_NEIGHBORHOODS_URL.to_string(),
                fields: NeighborhoodFields::default(),
            },
            municipalities: OutlineSource {
                url: DEFAULT_MUNICIPALITIES_URL.to_string(),
                name_field: None,
            },
        }
    }
}

impl SourceSpec {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }
}

/// Replaces `${VAR_NAME}` with the environment value, leaving unknown
/// variables untouched.
fn substitute_env_vars(content: &str) -> String {
    let re = match regex::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return content.to_string(),
    };

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

impl Validate for SourceSpec {
    fn validate(&self) -> Result<()> {
        validate_url("listings.url", &self.listings.url)?;
        validate_url("neighborhoods.url", &self.neighborhoods.url)?;
        validate_url("municipalities.url", &self.municipalities.url)?;

        validate_non_empty_string("listings.fields.category", &self.listings.fields.category)?;
        validate_non_empty_string("listings.fields.price", &self.listings.fields.price)?;
        validate_non_empty_string("listings.fields.lat", &self.listings.fields.lat)?;
        validate_non_empty_string("listings.fields.lon", &self.listings.fields.lon)?;
        validate_non_empty_string("neighborhoods.fields.name", &self.neighborhoods.fields.name)?;
        validate_non_empty_string(
            "neighborhoods.fields.municipality",
            &self.neighborhoods.fields.municipality,
        )?;

        Ok(())
    }
}
