//! Engine configuration loaded from JSON.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```json
//! {
//!   "shader_root": "shaders",
//!   "viewport": { "width": 1280, "height": 720 },
//!   "sonar": { "wave_width": 0.02 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gpu::Viewport;
use crate::shader::ShaderGenConfig;

/// Window size the viewport is reset to on `Rasterizer::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::sized(self.width, self.height)
    }

    /// Width over height, or 1.0 for a degenerate size.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Parameters of the sonar-light technique.
///
/// The lit band is a spherical shell of thickness `wave_width` that moves
/// outward at `wave_speed` and restarts every `wave_interval` world units,
/// up to `max_depth` from the light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonarConfig {
    pub wave_width: f32,
    pub max_depth: f32,
    pub wave_speed: f32,
    pub wave_interval: f32,
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            wave_width: 0.01,
            max_depth: 2.0,
            wave_speed: 0.5,
            wave_interval: 0.5,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory shader program names and imports are resolved against.
    pub shader_root: PathBuf,
    pub viewport: ViewportConfig,
    /// Clear color used by lit techniques.
    pub clear_color: [f32; 4],
    pub shader_generation: ShaderGenConfig,
    pub sonar: SonarConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shader_root: PathBuf::from("shaders"),
            viewport: ViewportConfig::default(),
            clear_color: [0.67, 0.84, 0.90, 1.0],
            shader_generation: ShaderGenConfig::default(),
            sonar: SonarConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a config from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid JSON or mistyped fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise see
    /// [`EngineConfig::from_json_str`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
