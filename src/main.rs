use clap::Parser;
use renta_map::core::pipeline::available_categories;
use renta_map::core::{ConfigProvider, Pipeline};
use renta_map::utils::{logger, validation::Validate};
use renta_map::{AppConfig, CliConfig, LocalStorage, MapEngine, MapPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting renta-map");

    let config = AppConfig::from_cli(cli)?;
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.output_path());
    let monitor_enabled = config.monitor();
    let pipeline = MapPipeline::new(storage, config.clone());

    // No category selected: fetch the listings and show what is available.
    if config.category().is_none() {
        let data = pipeline.extract().await?;
        let categories = available_categories(&data.listings);
        if categories.is_empty() {
            println!("No housing categories found in the listings dataset");
        } else {
            println!("Available housing categories:");
            for category in categories {
                println!("  {}", category);
            }
            println!("\nRe-run with --category <name> to build the map layers");
        }
        return Ok(());
    }

    let engine = MapEngine::new_with_monitoring(pipeline, monitor_enabled);
    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("Choropleth build completed");
            println!("✅ Map layers written to: {}", output_path);
        }
        Err(e) => {
            tracing::error!("Choropleth build failed: {} (severity: {:?})", e, e.severity());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                renta_map::utils::error::ErrorSeverity::Low => 0,
                renta_map::utils::error::ErrorSeverity::Medium => 2,
                renta_map::utils::error::ErrorSeverity::High => 1,
                renta_map::utils::error::ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
