use crate::config::sources::SourceSpec;
use crate::domain::model::{MapLayers, SourceData};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn sources(&self) -> &SourceSpec;
    fn category(&self) -> Option<&str>;
    fn classes(&self) -> usize;
    fn output_path(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceData>;
    async fn transform(&self, data: SourceData) -> Result<MapLayers>;
    async fn load(&self, layers: MapLayers) -> Result<String>;
}
