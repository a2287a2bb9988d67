pub mod types;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::Path;
pub use types::*;

const ENV_PREFIX: &str = "TOOL_BRIDGE";
const BACKEND_ENV_PREFIX: &str = "ODOO";

/// Load configuration from an optional TOML file, then `TOOL_BRIDGE_*` overrides
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Failed to build configuration")?;

    let app_config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load backend credentials from `ODOO_URL`, `ODOO_DB`, `ODOO_USERNAME`, `ODOO_PASSWORD`
pub fn load_backend_config() -> Result<BackendConfig> {
    let config = Config::builder()
        .add_source(Environment::with_prefix(BACKEND_ENV_PREFIX).prefix_separator("_"))
        .build()
        .context("Failed to read backend environment")?;

    config
        .try_deserialize()
        .context("Failed to deserialize backend configuration")
}

/// Validate the loaded configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        anyhow::bail!(
            "Invalid log level '{}'. Valid levels: {}",
            config.logging.level,
            valid_levels.join(", ")
        );
    }

    let valid_formats = ["pretty", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        anyhow::bail!(
            "Invalid log format '{}'. Valid formats: {}",
            config.logging.format,
            valid_formats.join(", ")
        );
    }

    config
        .connector
        .validate()
        .context("Invalid connector configuration")?;

    if let Some(endpoint) = &config.endpoint {
        endpoint
            .to_endpoint()
            .validate()
            .context("Invalid endpoint configuration")?;
    }

    Ok(())
}
