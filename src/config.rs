//! Camera module configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::traits::{CameraError, Result};

/// Direction a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Facing {
    /// Same side as the screen.
    #[default]
    Front,
    /// Opposite side from the screen.
    Back,
    /// Removable camera.
    External,
}

/// One camera exposed by the module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CameraConfig {
    /// Direction the camera faces.
    #[serde(default)]
    pub facing: Facing,

    /// Clockwise rotation of the sensor image, in degrees.
    #[serde(default)]
    pub orientation: u32,

    /// V4L2 node backing the camera. Without one the camera has no sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<PathBuf>,
}

/// Camera module configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HalConfig {
    /// Cameras in id order.
    #[serde(default, rename = "camera")]
    pub cameras: Vec<CameraConfig>,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            cameras: vec![CameraConfig::default()],
        }
    }
}

impl HalConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|err| CameraError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (id, camera) in self.cameras.iter().enumerate() {
            if !matches!(camera.orientation, 0 | 90 | 180 | 270) {
                return Err(CameraError::Config(format!(
                    "camera {id}: orientation {} is not a multiple of 90 below 360",
                    camera.orientation
                )));
            }
        }
        Ok(())
    }
}
