//! Settings loading from configuration files.
//!
//! This module loads [`Settings`] from TOML files, JSON files, and applies
//! environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (deep-merged over the defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `MDFORM_DEBUG` | `debug` |
//! | `MDFORM_LOG_LEVEL` | `log_level` |
//! | `MDFORM_CLASS_NAME` | `class_name` |
//! | `MDFORM_EXTENDS` | `extends` |
//! | `MDFORM_BLOCK` | `block` |
//! | `MDFORM_EXTENDS_PAGE` | `extends_page` |
//! | `MDFORM_BLOCK_PAGE` | `block_page` |
//! | `MDFORM_TEMPLATE_DIRS` | `template_dirs` (comma-separated) |
//! | `MDFORM_SOURCE_SUBDIR` | `source_subdir` |
//! | `MDFORM_MAX_UPLOAD_SIZE` | `max_upload_size` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use mdform_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/mdform.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::MdFormError;
use crate::settings::Settings;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "MDFORM_";

/// Loads settings from a TOML string.
///
/// Any settings not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, MdFormError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| MdFormError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, MdFormError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, MdFormError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, MdFormError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| MdFormError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, MdFormError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, MdFormError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `MDFORM_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Applies overrides looked up by their full variable name (e.g. `MDFORM_BLOCK`).
///
/// Values that fail to parse (a non-numeric `MDFORM_MAX_UPLOAD_SIZE`) are ignored.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(val) = var("DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }
    if let Some(val) = var("LOG_LEVEL") {
        settings.log_level = val;
    }
    if let Some(val) = var("CLASS_NAME") {
        settings.class_name = val;
    }
    if let Some(val) = var("EXTENDS") {
        settings.extends = val;
    }
    if let Some(val) = var("BLOCK") {
        settings.block = val;
    }
    if let Some(val) = var("EXTENDS_PAGE") {
        settings.extends_page = val;
    }
    if let Some(val) = var("BLOCK_PAGE") {
        settings.block_page = val;
    }
    if let Some(val) = var("TEMPLATE_DIRS") {
        settings.template_dirs = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
    }
    if let Some(val) = var("SOURCE_SUBDIR") {
        settings.source_subdir = val;
    }
    if let Some(val) = var("MAX_UPLOAD_SIZE") {
        if let Ok(size) = val.parse::<usize>() {
            settings.max_upload_size = size;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, MdFormError> {
    std::fs::read_to_string(path).map_err(|e| {
        MdFormError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, MdFormError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        MdFormError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;
    serde_json::from_value(merge_json(default_json, value)).map_err(|e| {
        MdFormError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
///
/// The `formatter` setting is an internally tagged enum, so it is replaced whole
/// rather than merged key by key.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) if key != "formatter" => merge_json(base_v, override_v),
                    _ => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
