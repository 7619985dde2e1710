//! Engine configuration loaded from YAML.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use std::path::Path;

use scenescript_common::Viewport;
use scenescript_scene::CameraSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings for the registry, runner and render coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub viewport: Viewport,
    pub camera: CameraSettings,
    /// Seconds per `fixed_update` step.
    pub fixed_step: f32,
    /// Upper bound of fixed steps run in one frame; excess time is dropped.
    pub max_fixed_steps: u32,
    /// Start with post-processing enabled.
    pub post_processing: bool,
    /// Publish a performance sample every N frames (0 disables).
    pub sample_interval: u32,
    /// Frames kept for performance averages.
    pub frame_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            camera: CameraSettings::default(),
            fixed_step: 1.0 / 60.0,
            max_fixed_steps: 5,
            post_processing: false,
            sample_interval: 60,
            frame_history: 120,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.fixed_step.is_nan() || self.fixed_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_step must be positive, got {}",
                self.fixed_step
            )));
        }
        if self.max_fixed_steps == 0 {
            return Err(ConfigError::Invalid("max_fixed_steps must be at least 1".into()));
        }
        let cam = &self.camera;
        let planes_ok = cam.near > 0.0 && cam.near < cam.far;
        if !planes_ok {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        let fov_ok = cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0;
        if !fov_ok {
            return Err(ConfigError::Invalid(format!(
                "camera fov must be within (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        Ok(())
    }
}
