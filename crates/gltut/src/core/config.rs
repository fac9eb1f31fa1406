//! # Tutorial Configuration
//!
//! Configuration for the tutorial runner: window size, projection
//! parameters, where shaders and meshes live, and the default log level.
//!
//! Every section has defaults, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! log_level = "debug"
//!
//! [projection]
//! fov_degrees = 60.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{Config, ConfigError};

/// # Window Configuration
///
/// Initial framebuffer size handed to the tutorial's first `reshape`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Framebuffer width in pixels
    pub width: u32,
    /// Framebuffer height in pixels
    pub height: u32,
    /// Window title a host should use
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            title: "OpenGl".to_string(),
        }
    }
}

impl WindowConfig {
    /// Width divided by height
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// # Projection Configuration
///
/// Perspective parameters for scenes that build their camera-to-clip matrix
/// from a field of view.
///
/// The defaults are the world scene's wide lens: 100 degrees with a near
/// plane at 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Distance to the near clipping plane
    pub z_near: f32,
    /// Distance to the far clipping plane
    pub z_far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 100.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

impl ProjectionConfig {
    /// Validate the projection parameters
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a non-positive near plane, a far
    /// plane not beyond the near plane, or a field of view outside (0, 180).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        if self.z_near <= 0.0 {
            return Err(ConfigError::Invalid(format!("z_near must be positive, got {}", self.z_near)));
        }
        if self.z_far <= self.z_near {
            return Err(ConfigError::Invalid(format!(
                "z_far ({}) must be greater than z_near ({})",
                self.z_far, self.z_near
            )));
        }
        Ok(())
    }
}

/// # Resource Configuration
///
/// Directories searched for shader and mesh files. Shaders found on disk
/// override the built-in sources with the same file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory holding `.vert` / `.frag` files
    pub shader_dir: Option<PathBuf>,
    /// Directory holding mesh XML documents
    pub mesh_dir: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            shader_dir: None,
            mesh_dir: PathBuf::from("resources/meshes"),
        }
    }
}

/// # Tutorial Configuration
///
/// Top-level configuration used by the [`Engine`](crate::Engine) and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Projection settings
    pub projection: ProjectionConfig,
    /// Resource locations
    pub resources: ResourceConfig,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            projection: ProjectionConfig::default(),
            resources: ResourceConfig::default(),
        }
    }
}

impl TutorialConfig {
    /// Set the window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Set the mesh directory
    #[must_use]
    pub fn with_mesh_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources.mesh_dir = dir.into();
        self
    }

    /// Set the shader override directory
    #[must_use]
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources.shader_dir = Some(dir.into());
        self
    }

    /// Set the default log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }
        self.projection.validate()
    }
}

impl Config for TutorialConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults_are_valid() {
        let config = TutorialConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TutorialConfig::parse(
            r#"
log_level = "debug"

[projection]
fov_degrees = 60.0
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.projection.fov_degrees, 60.0);
        assert_eq!(config.projection.z_near, 0.1);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_ron_config() {
        let config = TutorialConfig::parse(
            "(window: (width: 800, height: 400), resources: (mesh_dir: \"meshes\"))",
            ConfigFormat::Ron,
        )
        .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.aspect_ratio(), 2.0);
        assert_eq!(config.resources.mesh_dir, PathBuf::from("meshes"));
    }

    #[test]
    fn test_validation_rejects_bad_projection() {
        let mut config = TutorialConfig::default();
        config.projection.z_far = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TutorialConfig::default();
        config.projection.fov_degrees = 180.0;
        assert!(config.validate().is_err());

        let config = TutorialConfig::default().with_window_size(0, 10);
        assert!(config.validate().is_err());

        let config = TutorialConfig::default().with_log_level("loud");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("gltut-config-{}.toml", std::process::id()));
        let config = TutorialConfig::default()
            .with_window_size(1024, 768)
            .with_shader_dir("custom/shaders");

        config.save_to_file(&path).unwrap();
        let loaded = TutorialConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }
}
