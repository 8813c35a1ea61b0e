// Configuration module for content-store
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
    let mut config = ConfigLoader::read(path).context("Failed to load configuration")?;
    apply_env_overrides(&mut config);
    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Allow environment variables to override config values
pub fn apply_env_overrides(config: &mut StoreConfig) {
    if let Ok(token) = std::env::var("CONTENT_STORE_TOKEN") {
        config.security.token = Some(token);
    }

    if let Ok(level) = std::env::var("CONTENT_STORE_LOG_LEVEL") {
        config.logging.level = level;
    }
}
