use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("GeoJSON decoding error: {0}")]
    GeoJsonError(#[from] geojson::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dataset `{dataset}` is missing required field `{field}`")]
    SchemaMismatch { dataset: String, field: String },

    #[error("Dataset `{dataset}` is not a GeoJSON FeatureCollection")]
    UnexpectedGeoJson { dataset: String },

    #[error("Invalid geometry for `{id}`: {reason}")]
    InvalidGeometry { id: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MapError::InvalidGeometry { .. } => ErrorSeverity::Low,
            MapError::HttpError(_) => ErrorSeverity::Medium,
            MapError::CsvError(_)
            | MapError::GeoJsonError(_)
            | MapError::SerializationError(_)
            | MapError::SchemaMismatch { .. }
            | MapError::UnexpectedGeoJson { .. } => ErrorSeverity::High,
            MapError::IoError(_)
            | MapError::TomlError(_)
            | MapError::ConfigError { .. }
            | MapError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MapError::HttpError(_) => "Could not download one of the datasets".to_string(),
            MapError::CsvError(_) => "The listings file could not be read".to_string(),
            MapError::GeoJsonError(_) | MapError::UnexpectedGeoJson { .. } => {
                "A boundary file could not be read".to_string()
            }
            MapError::SchemaMismatch { dataset, field } => {
                format!("The {} dataset has no `{}` column", dataset, field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MapError::HttpError(_) => "Check your network connection and the configured dataset URLs",
            MapError::CsvError(_) | MapError::SchemaMismatch { .. } => {
                "Check the field mapping in your sources file against the dataset headers"
            }
            MapError::GeoJsonError(_) | MapError::UnexpectedGeoJson { .. } => {
                "Verify the boundary URLs point at GeoJSON FeatureCollections"
            }
            MapError::ConfigError { .. } | MapError::InvalidConfigValueError { .. } => {
                "Review the command line flags and sources file"
            }
            MapError::IoError(_) => "Check that the output path exists and is writable",
            _ => "Re-run with --verbose for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
