//! Settings loading: defaults → file deep-merge → env overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::errors::Result;
use crate::types::MicaSettings;

/// Path of the user settings file (`~/.mica/settings.json`).
#[must_use]
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".mica").join("settings.json")
}

/// Deep-merge `overlay` onto `base`.
///
/// Objects merge key-by-key recursively; any other value type replaces the
/// base value wholesale.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<MicaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file, deep-merged over defaults,
/// with `MICA_*` env overrides applied last.
///
/// A missing file is not an error — defaults plus env overrides are used.
pub fn load_settings_from_path(path: &Path) -> Result<MicaSettings> {
    let defaults = serde_json::to_value(MicaSettings::default())?;

    let merged = if path.is_file() {
        let raw = std::fs::read_to_string(path)?;
        let file_value: Value = serde_json::from_str(&raw)?;
        deep_merge(defaults, file_value)
    } else {
        defaults
    };

    let mut settings: MicaSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Apply `MICA_*` environment variable overrides (highest priority).
fn apply_env_overrides(settings: &mut MicaSettings) {
    if let Ok(path) = std::env::var("MICA_WORKSPACE") {
        settings.workspace.path = Some(path);
    }
    if let Ok(model) = std::env::var("MICA_MODEL") {
        settings.agent.model = Some(model);
    }
    if let Ok(raw) = std::env::var("MICA_MAX_ITERATIONS") {
        match raw.parse() {
            Ok(n) => settings.agent.max_iterations = n,
            Err(_) => warn!(value = %raw, "ignoring invalid MICA_MAX_ITERATIONS"),
        }
    }
    if let Ok(raw) = std::env::var("MICA_COMPACTION_ENABLED") {
        match raw.parse() {
            Ok(b) => settings.compaction.enabled = b,
            Err(_) => warn!(value = %raw, "ignoring invalid MICA_COMPACTION_ENABLED"),
        }
    }
    if let Ok(raw) = std::env::var("MICA_TOKEN_THRESHOLD") {
        match raw.parse() {
            Ok(n) => settings.compaction.token_threshold = n,
            Err(_) => warn!(value = %raw, "ignoring invalid MICA_TOKEN_THRESHOLD"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
