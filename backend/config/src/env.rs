//! Environment variable overrides.
//!
//! Variables take precedence over the YAML file. Unset variables leave the
//! current value alone; set-but-unparsable variables are an error rather than
//! being silently ignored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::schema::{AppConfig, CropRegion};

/// A variable was set to a value that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value {value:?} for env var \"{var_name}\": {reason}")]
pub struct EnvOverrideError {
    pub var_name: String,
    pub value: String,
    pub reason: String,
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: AppConfig) -> Result<AppConfig, EnvOverrideError> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: AppConfig,
    env: &HashMap<String, String>,
) -> Result<AppConfig, EnvOverrideError> {
    let lookup = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(v) = lookup("UPLOAD_FOLDER") {
        config.server.upload_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("PORT") {
        config.server.port = parse("PORT", v)?;
    }
    if let Some(v) = lookup("CARDSCAN_BIND") {
        config.server.bind_address = v.to_string();
    }
    if let Some(v) = lookup("MAX_UPLOAD_BYTES") {
        config.server.max_upload_bytes = parse("MAX_UPLOAD_BYTES", v)?;
    }

    if let Some(v) = lookup("TESSERACT_PATH") {
        config.ocr.tesseract_path = v.to_string();
    }
    if let Some(v) = lookup("OCR_LANGUAGE") {
        config.ocr.language = v.to_string();
    }
    if let Some(v) = lookup("OCR_OEM") {
        config.ocr.engine_mode = parse("OCR_OEM", v)?;
    }
    if let Some(v) = lookup("OCR_PSM") {
        config.ocr.page_seg_mode = parse("OCR_PSM", v)?;
    }
    if let Some(v) = lookup("OCR_TIMEOUT_SECS") {
        config.ocr.timeout_secs = parse("OCR_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = lookup("OCR_RESIZE_WIDTH") {
        config.ocr.resize_width = parse("OCR_RESIZE_WIDTH", v)?;
    }
    if let Some(v) = lookup("OCR_CROP") {
        config.ocr.crop = parse_crop(v)?;
    }

    if let Some(v) = lookup("OCR_WORKERS") {
        config.tasks.workers = parse("OCR_WORKERS", v)?;
    }
    if let Some(v) = lookup("OCR_QUEUE_CAPACITY") {
        config.tasks.queue_capacity = parse("OCR_QUEUE_CAPACITY", v)?;
    }
    if let Some(v) = lookup("TASK_TTL_SECS") {
        config.tasks.ttl_secs = parse("TASK_TTL_SECS", v)?;
    }
    if let Some(v) = lookup("TASK_MAX_ENTRIES") {
        config.tasks.max_entries = parse("TASK_MAX_ENTRIES", v)?;
    }

    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v.to_string();
    }
    if let Some(v) = lookup("CARDSCAN_LOG_JSON") {
        config.logging.json = parse_bool("CARDSCAN_LOG_JSON", v)?;
    }
    if let Some(v) = lookup("CARDSCAN_LOG_DIR") {
        config.logging.dir = Some(PathBuf::from(v));
    }

    Ok(config)
}

fn parse<T>(var_name: &str, value: &str) -> Result<T, EnvOverrideError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| EnvOverrideError {
        var_name: var_name.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var_name: &str, value: &str) -> Result<bool, EnvOverrideError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EnvOverrideError {
            var_name: var_name.to_string(),
            value: value.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}

/// Parse `x,y,width,height`, or `none` to disable cropping.
pub fn parse_crop(value: &str) -> Result<Option<CropRegion>, EnvOverrideError> {
    let invalid = |reason: &str| EnvOverrideError {
        var_name: "OCR_CROP".to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if matches!(value.to_ascii_lowercase().as_str(), "none" | "off" | "false") {
        return Ok(None);
    }

    let parts: Vec<u32> = value
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| invalid(&e.to_string()))?;

    match parts[..] {
        [x, y, width, height] => Ok(Some(CropRegion { x, y, width, height })),
        _ => Err(invalid("expected x,y,width,height")),
    }
}
