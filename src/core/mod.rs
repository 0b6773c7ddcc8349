pub mod aggregate;
pub mod classify;
pub mod engine;
pub mod index;
pub mod join;
pub mod pipeline;

pub use crate::domain::model::{MapLayers, SourceData};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
