pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{AppConfig, CliConfig};

pub use adapters::storage::LocalStorage;
pub use app::pipelines::map_pipeline::MapPipeline;
pub use core::{engine::MapEngine, pipeline::ChoroplethPipeline};
pub use utils::error::{MapError, Result};
