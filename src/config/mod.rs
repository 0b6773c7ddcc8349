pub mod sources;

#[cfg(feature = "cli")]
pub mod cli;

pub use sources::SourceSpec;

#[cfg(feature = "cli")]
pub use cli::{AppConfig, CliConfig};
