// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings serialization and deserialization.
//!
//! This module handles reading and writing the settings document in YAML
//! and JSON formats, and locating it at startup.

use crate::models::settings::Settings;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "REDLINE_CONFIG";

/// Settings file looked for in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "redline.yaml";

/// Export settings to YAML format.
pub fn export_yaml(data: &Settings, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export settings to JSON format.
pub fn export_json(data: &Settings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import settings, picking the format from the file extension.
pub fn import_settings(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path.extension().and_then(|s| s.to_str());
    let settings: Settings = match extension {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
        Some("json") => serde_json::from_str(&text)?,
        _ => bail!("Unsupported settings extension: {:?}", extension),
    };
    Ok(settings.sanitized())
}

/// Locate and load settings, falling back to defaults.
///
/// `REDLINE_CONFIG` wins over `redline.yaml` in the working directory. A
/// file that exists but cannot be parsed is logged and ignored.
pub fn load_settings() -> Settings {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()));

    let Some(path) = path else {
        log::debug!("No settings file, using defaults");
        return Settings::default();
    };

    match import_settings(&path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::error!("Failed to load settings from {}: {:#}", path.display(), e);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("redline-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let path = scratch("partial.yaml");
        std::fs::write(&path, "stroke:\n  width: 5.0\ncompression:\n  max_width: 640\n").unwrap();

        let settings = import_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.stroke.width, 5.0);
        assert_eq!(settings.stroke.color, [255, 0, 0, 255]);
        assert_eq!(settings.compression.max_width, 640);
        assert_eq!(settings.compression.max_height, 800);
        assert_eq!(settings.output_quality, 0.9);
    }

    #[test]
    fn test_json_roundtrip() {
        let path = scratch("settings.json");
        let mut original = Settings::default();
        original.output_quality = 0.75;
        original.stroke.color = [0, 0, 255, 255];

        export_json(&original, &path).unwrap();
        let loaded = import_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let path = scratch("settings.toml");
        std::fs::write(&path, "output_quality = 0.5").unwrap();
        let result = import_settings(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let path = scratch("broken.yml");
        std::fs::write(&path, "stroke: [not, a, map").unwrap();
        let result = import_settings(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
