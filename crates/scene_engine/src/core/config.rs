//! # Unified Configuration System
//!
//! Configuration for the scene, the renderer and the resource manager,
//! gathered under [`EngineConfig`]. Every struct is serializable through the
//! [`Config`] trait (TOML or RON) and offers builder-style setters plus a
//! `validate` pass.

use serde::{Serialize, Deserialize};
use std::path::PathBuf;

use crate::config::{Config, ConfigError};

/// # Scene Configuration
///
/// Scene file naming, frame-rate reporting and start-up content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Extension appended to scene file paths that lack it (no leading dot)
    pub file_extension: String,
    /// Length of one FPS reporting window in milliseconds
    pub fps_report_interval_ms: u64,
    /// Whether `Scene::initialize` creates the default camera, skybox and light
    pub create_default_objects: bool,
    /// Initial viewport width used for picking
    pub viewport_width: u32,
    /// Initial viewport height used for picking
    pub viewport_height: u32,
}

impl SceneConfig {
    /// Create a scene configuration with defaults
    pub fn new() -> Self {
        Self {
            file_extension: "scene".to_string(),
            fps_report_interval_ms: 1000,
            create_default_objects: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }

    /// Set the viewport size used for picking
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Enable or disable creation of the default objects
    pub fn with_default_objects(mut self, enabled: bool) -> Self {
        self.create_default_objects = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_extension.is_empty() || self.file_extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "Scene file extension must be non-empty and without a leading dot: '{}'",
                self.file_extension
            )));
        }
        if self.fps_report_interval_ms == 0 {
            return Err(ConfigError::Invalid("FPS report interval must be at least 1ms".to_string()));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(ConfigError::Invalid("Viewport dimensions must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Renderer Configuration
///
/// Frame target sizing and clear colour for the render pass driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Largest width or height accepted by `Renderer::set_resolution`
    pub max_resolution: u32,
    /// Initial frame width
    pub initial_width: u32,
    /// Initial frame height
    pub initial_height: u32,
    /// RGBA clear colour of the frame target
    pub clear_color: [f32; 4],
}

impl RendererConfig {
    /// Create a renderer configuration with defaults
    pub fn new() -> Self {
        Self {
            max_resolution: 16384,
            initial_width: 1280,
            initial_height: 720,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Set the initial frame resolution
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.initial_width = width;
        self.initial_height = height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_width == 0 || self.initial_height == 0 {
            return Err(ConfigError::Invalid("Initial resolution must be non-zero".to_string()));
        }
        if self.initial_width > self.max_resolution || self.initial_height > self.max_resolution {
            return Err(ConfigError::Invalid(format!(
                "Initial resolution {}x{} exceeds the maximum of {}",
                self.initial_width, self.initial_height, self.max_resolution
            )));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Resource Configuration
///
/// Where each kind of resource lives on disk, relative to `root_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Base directory for resources
    pub root_dir: PathBuf,
    /// Mesh sub-directory
    pub meshes_dir: String,
    /// Material sub-directory
    pub materials_dir: String,
    /// Texture sub-directory
    pub textures_dir: String,
    /// Script sub-directory
    pub scripts_dir: String,
}

impl ResourceConfig {
    /// Create a resource configuration with defaults
    pub fn new() -> Self {
        Self {
            root_dir: PathBuf::from("resources"),
            meshes_dir: "meshes".to_string(),
            materials_dir: "materials".to_string(),
            textures_dir: "textures".to_string(),
            scripts_dir: "scripts".to_string(),
        }
    }

    /// Set the resource root directory
    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = dir.into();
        self
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Engine Configuration
///
/// Top-level configuration that encompasses all subsystems of the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Scene configuration
    pub scene: SceneConfig,
    /// Renderer configuration
    pub renderer: RendererConfig,
    /// Resource configuration
    pub resources: ResourceConfig,
}

impl EngineConfig {
    /// Create a new engine configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            scene: SceneConfig::default(),
            renderer: RendererConfig::default(),
            resources: ResourceConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scene.validate()?;
        self.renderer.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_extension_with_leading_dot_is_rejected() {
        let mut config = SceneConfig::default();
        config.file_extension = ".scene".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_initial_resolution_is_rejected() {
        let config = RendererConfig::default().with_resolution(20000, 720);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trip_toml_and_ron() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new().with_log_level("debug");

        for name in ["engine.toml", "engine.ron"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            let loaded = EngineConfig::load_from_file(&path).unwrap();
            assert_eq!(loaded.log_level, "debug");
            assert_eq!(loaded.scene.file_extension, "scene");
            assert_eq!(loaded.renderer.max_resolution, 16384);
        }
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let result = EngineConfig::default().save_to_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
