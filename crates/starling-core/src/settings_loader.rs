//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `STARLING_DEBUG` | `debug` |
//! | `STARLING_LOG_LEVEL` | `log_level` |
//! | `STARLING_DEFAULT_CHARSET` | `default_charset` |
//! | `STARLING_FILE_CHUNK_SIZE` | `file_chunk_size` |
//! | `STARLING_STREAM_BUFFER` | `stream_buffer` |
//! | `STARLING_TEMPLATE_DIRS` | `template_dirs` (OS path-list syntax) |
//! | `STARLING_JSON_RESPONSES` | `capabilities.json` |
//! | `STARLING_FILE_RESPONSES` | `capabilities.file` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use starling_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/starling.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::StarlingError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, StarlingError> {
    // Go through serde_json::Value so that a partial document can be merged
    // over the serialized defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| StarlingError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, StarlingError> {
    let content = read_config(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, StarlingError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, StarlingError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| StarlingError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, StarlingError> {
    let content = read_config(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, StarlingError> {
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

/// Applies `STARLING_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes"; anything else is false.
/// Numeric variables that fail to parse leave the setting unchanged.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("STARLING_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("STARLING_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("STARLING_DEFAULT_CHARSET") {
        settings.default_charset = val;
    }

    if let Ok(val) = std::env::var("STARLING_FILE_CHUNK_SIZE") {
        if let Ok(size) = val.parse::<usize>() {
            if size > 0 {
                settings.file_chunk_size = size;
            }
        }
    }

    if let Ok(val) = std::env::var("STARLING_STREAM_BUFFER") {
        if let Ok(size) = val.parse::<usize>() {
            if size > 0 {
                settings.stream_buffer = size;
            }
        }
    }

    if let Some(val) = std::env::var_os("STARLING_TEMPLATE_DIRS") {
        settings.template_dirs = std::env::split_paths(&val)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
    }

    if let Ok(val) = std::env::var("STARLING_JSON_RESPONSES") {
        settings.capabilities.json = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("STARLING_FILE_RESPONSES") {
        settings.capabilities.file = parse_flag(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, StarlingError> {
    std::fs::read_to_string(path).map_err(|e| {
        StarlingError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, StarlingError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        StarlingError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        StarlingError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
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
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each env test owns its variable: tests run in parallel within one process.

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            default_charset = "latin-1"
            file_chunk_size = 65536
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.default_charset, "latin-1");
        assert_eq!(settings.file_chunk_size, 65536);
        // Defaults preserved
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_str_capabilities_partial() {
        let toml = r"
            [capabilities]
            file = false
        ";

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.capabilities.file);
        assert!(settings.capabilities.json);
    }

    #[test]
    fn test_from_toml_str_template_dirs() {
        let toml = r#"
            template_dirs = ["templates", "/srv/shared/templates"]
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.template_dirs.len(), 2);
        assert_eq!(settings.template_dirs[0], Path::new("templates"));
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.file_chunk_size, 4096);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(StarlingError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str(r#"file_chunk_size = "big""#);
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "debug": false,
            "log_level": "debug",
            "stream_buffer": 4
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.stream_buffer, 4);
        assert_eq!(settings.default_charset, "utf-8");
    }

    #[test]
    fn test_from_json_str_empty_object() {
        let settings = from_json_str("{}").unwrap();
        assert!(settings.debug);
    }

    #[test]
    fn test_from_json_str_invalid() {
        let result = from_json_str("{invalid json");
        assert!(result.is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("starling.toml");
        std::fs::write(&path, "debug = false\nlog_level = \"warn\"\n").unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("starling.json");
        std::fs::write(&path, r#"{"file_chunk_size": 1024}"#).unwrap();

        let settings = from_json_file(&path).unwrap();
        assert_eq!(settings.file_chunk_size, 1024);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/path/starling.toml");
        assert!(matches!(result, Err(StarlingError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = from_json_file("/nonexistent/path/starling.json");
        assert!(result.is_err());
    }

    // ── Environment variable overrides ──────────────────────────────

    #[test]
    fn test_apply_env_overrides_log_level() {
        let mut settings = Settings::default();
        std::env::set_var("STARLING_LOG_LEVEL", "trace");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.log_level, "trace");
        std::env::remove_var("STARLING_LOG_LEVEL");
    }

    #[test]
    fn test_apply_env_overrides_chunk_size() {
        let mut settings = Settings::default();
        std::env::set_var("STARLING_FILE_CHUNK_SIZE", "512");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.file_chunk_size, 512);
        std::env::remove_var("STARLING_FILE_CHUNK_SIZE");
    }

    #[test]
    fn test_apply_env_overrides_invalid_buffer() {
        let mut settings = Settings::default();
        std::env::set_var("STARLING_STREAM_BUFFER", "lots");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.stream_buffer, 16);
        std::env::remove_var("STARLING_STREAM_BUFFER");
    }

    #[test]
    fn test_apply_env_overrides_capability_flag() {
        let mut settings = Settings::default();
        std::env::set_var("STARLING_JSON_RESPONSES", "0");
        apply_env_overrides(&mut settings);
        assert!(!settings.capabilities.json);
        std::env::remove_var("STARLING_JSON_RESPONSES");
    }

    #[test]
    fn test_toml_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("starling.toml");
        std::fs::write(&path, "default_charset = \"utf-8\"\n").unwrap();

        std::env::set_var("STARLING_DEFAULT_CHARSET", "iso-8859-1");
        let settings = from_toml_file_with_env(&path).unwrap();
        assert_eq!(settings.default_charset, "iso-8859-1");
        std::env::remove_var("STARLING_DEFAULT_CHARSET");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("YES"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        let merged = merge_json(base, over);
        assert_eq!(merged["list"], serde_json::json!([4, 5]));
    }
}
