//! Configuration loading and display.

use gatehouse::{GatehouseConfig, GatehouseResult};
use std::path::Path;
use tracing::debug;

/// Load configuration from `path`, or from the layered defaults when absent.
pub fn load_config(path: Option<&Path>) -> GatehouseResult<GatehouseConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration file");
            GatehouseConfig::from_file(path)
        }
        None => GatehouseConfig::load(),
    }
}

/// Print the effective configuration as TOML.
pub fn show_config(config: &GatehouseConfig) -> GatehouseResult<()> {
    println!("{}", config.to_toml()?);
    Ok(())
}
