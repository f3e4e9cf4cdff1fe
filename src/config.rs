//! Engine Configuration
//!
//! JSON, camelCase, every field optional. Bounds on scale and opacity are
//! model invariants and are not configurable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::compositor::{FitMode, Size};
use crate::transform::{Point, DEFAULT_POSITION, ROTATION_STEP_DEGREES};

pub const DEFAULT_STORAGE_KEY: &str = "INKSCAPE_SAVED_DESIGNS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Preview canvas in screen units.
    #[serde(default = "default_canvas")]
    pub canvas: Size,
    /// Edge length of the unscaled overlay box.
    #[serde(default = "default_overlay_reference_size")]
    pub overlay_reference_size: f32,
    #[serde(default = "default_position")]
    pub default_position: Point,
    #[serde(default = "default_rotation_step")]
    pub rotation_step: f32,
    #[serde(default)]
    pub base_fit: FitMode,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_canvas() -> Size { Size::new(400.0, 400.0) }
fn default_overlay_reference_size() -> f32 { 100.0 }
fn default_position() -> Point { DEFAULT_POSITION }
fn default_rotation_step() -> f32 { ROTATION_STEP_DEGREES }
fn default_storage_key() -> String { DEFAULT_STORAGE_KEY.to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas: default_canvas(),
            overlay_reference_size: default_overlay_reference_size(),
            default_position: default_position(),
            rotation_step: default_rotation_step(),
            base_fit: FitMode::default(),
            storage_key: default_storage_key(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        info!(path = %path.display(), storage_key = %config.storage_key, "Loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !positive(self.canvas.width) || !positive(self.canvas.height) {
            return Err(ConfigError::Invalid(format!(
                "canvas must be positive, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if !positive(self.overlay_reference_size) {
            return Err(ConfigError::Invalid(format!(
                "overlayReferenceSize must be positive, got {}",
                self.overlay_reference_size
            )));
        }
        if !positive(self.rotation_step) {
            return Err(ConfigError::Invalid(format!(
                "rotationStep must be positive, got {}",
                self.rotation_step
            )));
        }
        if !self.default_position.is_finite() {
            return Err(ConfigError::Invalid("defaultPosition must be finite".into()));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storageKey must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.storage_key, "INKSCAPE_SAVED_DESIGNS");
        assert_eq!(config.base_fit, FitMode::Cover);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json_str(
            r#"{"canvas":{"width":320,"height":480},"rotationStep":45,"baseFit":"contain"}"#,
        )
        .unwrap();
        assert_eq!(config.canvas, Size::new(320.0, 480.0));
        assert_eq!(config.rotation_step, 45.0);
        assert_eq!(config.base_fit, FitMode::Contain);
        assert_eq!(config.overlay_reference_size, 100.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_json_str(r#"{"overlayReferenceSize":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_json_str(r#"{"storageKey":" "}"#).unwrap_err();
        assert!(err.to_string().contains("storageKey"));
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"storageKey":"designs_v2"}"#).unwrap();
        let config = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.storage_key, "designs_v2");
    }
}
