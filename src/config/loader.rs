// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::Result;

use super::model::SystemConfig;

/// Load and validate a [`SystemConfig`] from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SystemConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading configuration");

    let raw = fs::read_to_string(path)?;
    parse_config(&raw)
}

/// Parse and validate a [`SystemConfig`] from TOML text.
pub fn parse_config(raw: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}
