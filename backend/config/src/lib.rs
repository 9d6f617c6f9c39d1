//! `cardscan-config`: CardScan runtime configuration management.
//!
//! Provides:
//! - Typed config schema (server, OCR, tasks, logging, classifier)
//! - Optional YAML config file
//! - Environment variable overrides (`UPLOAD_FOLDER`, `PORT`, `OCR_*`, ...)
//! - Validation with errors and warnings

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use env::{apply_env_overrides, apply_env_overrides_with, parse_crop, EnvOverrideError};
pub use io::load_config;
pub use schema::{
    AppConfig, ClassifierConfig, CropRegion, LoggingConfig, OcrSettings, ServerConfig,
    TaskSettings,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load the optional config file and apply env overrides, without validating.
pub async fn load(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config(path).await?,
        None => AppConfig::default(),
    };
    apply_env_overrides(config).context("Failed to apply env overrides")
}

/// Log validation warnings; abort with every error listed if any.
pub fn ensure_valid(config: &AppConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", messages.join("\n  "));
    }
    Ok(())
}

/// [`load`] followed by [`ensure_valid`].
pub async fn load_and_prepare(path: Option<&Path>) -> Result<AppConfig> {
    let config = load(path).await?;
    ensure_valid(&config)?;
    Ok(config)
}
