use crate::utils::error::Result;
use reqwest::Client;

/// Thin wrapper over the HTTP client for dataset downloads.
#[derive(Debug, Clone, Default)]
pub struct DatasetFetcher {
    client: Client,
}

impl DatasetFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
