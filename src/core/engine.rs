use crate::core::Pipeline;
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through extract, transform and load.
pub struct MapEngine<P: Pipeline> {
    pipeline: P,
    #[cfg(feature = "cli")]
    monitor: SystemMonitor,
}

impl<P: Pipeline> MapEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            #[cfg(feature = "cli")]
            monitor: SystemMonitor::new(false),
        }
    }

    #[cfg(feature = "cli")]
    pub fn new_with_monitoring(pipeline: P, enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Fetching datasets...");
        let data = self.pipeline.extract().await?;
        tracing::info!(
            "Fetched {} listings, {} neighborhoods, {} municipalities",
            data.listings.len(),
            data.neighborhoods.len(),
            data.municipalities.len()
        );
        #[cfg(feature = "cli")]
        self.monitor.log_stage("extract");

        tracing::info!("Running choropleth pipeline...");
        let layers = self.pipeline.transform(data).await?;
        tracing::info!(
            "Classified {} of {} neighborhoods ({} listings joined)",
            layers.summary.classified,
            layers.neighborhoods.len(),
            layers.summary.joined
        );
        #[cfg(feature = "cli")]
        self.monitor.log_stage("transform");

        tracing::info!("Writing map layers...");
        let output_path = self.pipeline.load(layers).await?;
        tracing::info!("Layers written to: {}", output_path);
        #[cfg(feature = "cli")]
        self.monitor.log_stage("load");

        Ok(output_path)
    }
}
