//! # Renderer Configuration
//!
//! All tunables of a render session in one serde tree, loadable from TOML or
//! RON through [`Config`]. Defaults reproduce the classic overlay setup: a
//! 224x224 solid render, three white point lights and a 0.3 ambient term.

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// A single point light placed in the scene for the session's lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    /// World-space position of the light
    pub position: [f32; 3],
    /// Linear RGB color
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
}

impl LightConfig {
    /// White light of intensity 1 at `position`
    pub fn white_at(position: [f32; 3]) -> Self {
        Self {
            position,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Metallic/roughness constants shared by every mesh the session inserts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Metallic factor
    pub metallic: f32,
    /// Roughness factor
    pub roughness: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            metallic: 0.5,
            roughness: 1.0,
        }
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter, used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// # Render Session Configuration
///
/// Fixed for the life of a session: the output resolution and the
/// wireframe flag cannot change once the session exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Output resolution as `(width, height)` in pixels
    pub resolution: (u32, u32),
    /// Render triangle edges only instead of filled triangles
    pub wireframe: bool,
    /// Keep a white canvas around for background-less `pop_and_render` calls
    pub render_on_white: bool,
    /// Scene ambient light color
    pub ambient_light: [f32; 3],
    /// Clear color of the offscreen pass; alpha 0 keeps the background visible
    pub bg_color: [f32; 4],
    /// Point lights inserted when the session is created
    pub lights: Vec<LightConfig>,
    /// Material constants
    pub material: MaterialConfig,
    /// Default color for body meshes
    pub human_color: [f32; 3],
    /// Default color for auxiliary object meshes
    pub object_color: [f32; 3],
    /// Far plane stored on every weak-perspective camera
    pub weak_perspective_zfar: f32,
    /// Vertical field of view (radians) of the default perspective camera
    pub default_camera_yfov: f32,
    /// Logging setup
    pub logging: LoggingConfig,
}

impl RendererConfig {
    /// Number of point lights a session keeps alive
    pub const LIGHT_COUNT: usize = 3;

    /// Create a configuration for the given output resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: (width, height),
            ..Self::default()
        }
    }

    /// Enable or disable wireframe rendering
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    /// Cache a white canvas at construction
    pub fn with_render_on_white(mut self, render_on_white: bool) -> Self {
        self.render_on_white = render_on_white;
        self
    }

    /// Replace the default body color
    pub fn with_human_color(mut self, color: [f32; 3]) -> Self {
        self.human_color = color;
        self
    }

    /// Replace the default object color
    pub fn with_object_color(mut self, color: [f32; 3]) -> Self {
        self.object_color = color;
        self
    }

    /// Set the default log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Output width in pixels
    pub fn width(&self) -> u32 {
        self.resolution.0
    }

    /// Output height in pixels
    pub fn height(&self) -> u32 {
        self.resolution.1
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.resolution;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution must be non-zero, got {width}x{height}"
            )));
        }

        if self.lights.len() != Self::LIGHT_COUNT {
            return Err(ConfigError::Invalid(format!(
                "expected {} lights, got {}",
                Self::LIGHT_COUNT,
                self.lights.len()
            )));
        }

        if !(self.weak_perspective_zfar.is_finite() && self.weak_perspective_zfar > 0.0) {
            return Err(ConfigError::Invalid("weak_perspective_zfar must be positive".to_string()));
        }

        if !(self.default_camera_yfov > 0.0 && self.default_camera_yfov < std::f32::consts::PI) {
            return Err(ConfigError::Invalid("default_camera_yfov must lie in (0, pi)".to_string()));
        }

        let colors = [self.human_color, self.object_color, self.ambient_light];
        if colors.iter().flatten().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(ConfigError::Invalid("colors must be finite and non-negative".to_string()));
        }

        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            resolution: (224, 224),
            wireframe: false,
            render_on_white: false,
            ambient_light: [0.3, 0.3, 0.3],
            bg_color: [0.0, 0.0, 0.0, 0.0],
            lights: vec![
                LightConfig::white_at([0.0, -1.0, 1.0]),
                LightConfig::white_at([0.0, 1.0, 1.0]),
                LightConfig::white_at([1.0, 1.0, 2.0]),
            ],
            material: MaterialConfig::default(),
            human_color: [1.0, 1.0, 0.9],
            object_color: [0.3, 1.0, 0.3],
            weak_perspective_zfar: 1000.0,
            default_camera_yfov: std::f32::consts::FRAC_PI_3,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config for RendererConfig {}
