use crate::config::sources::SourceSpec;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "renta-map")]
#[command(about = "Rental-price choropleth builder for the Monterrey metropolitan area")]
pub struct CliConfig {
    #[arg(long, help = "Housing category to map; omit to list the available categories")]
    pub category: Option<String>,

    #[arg(long, default_value = "5", help = "Number of quantile classes")]
    pub classes: usize,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, help = "TOML file overriding dataset endpoints and field mappings")]
    pub sources: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system stats after each pipeline stage")]
    pub monitor: bool,
}

/// CLI flags plus the resolved dataset sources.
#[derive(Debug, Clone)]
pub struct AppConfig {
    cli: CliConfig,
    sources: SourceSpec,
}

impl AppConfig {
    pub fn new(cli: CliConfig, sources: SourceSpec) -> Self {
        Self { cli, sources }
    }

    pub fn from_cli(cli: CliConfig) -> Result<Self> {
        let sources = match &cli.sources {
            Some(path) => SourceSpec::from_file(path)?,
            None => SourceSpec::default(),
        };
        Ok(Self::new(cli, sources))
    }

    pub fn monitor(&self) -> bool {
        self.cli.monitor
    }
}

impl ConfigProvider for AppConfig {
    fn sources(&self) -> &SourceSpec {
        &self.sources
    }

    fn category(&self) -> Option<&str> {
        self.cli.category.as_deref()
    }

    fn classes(&self) -> usize {
        self.cli.classes
    }

    fn output_path(&self) -> &str {
        &self.cli.output_path
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("classes", self.cli.classes, 1)?;
        validate_path("output_path", &self.cli.output_path)?;
        self.sources.validate()
    }
}
