//! Surface materials stored as RON

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Resource, ResourceError, ResourceKind, ResourceResult};

/// Material parameters consumed by the lighting pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Display name
    pub name: String,
    /// Linear RGBA albedo
    pub base_color: [f32; 4],
    /// Perceptual roughness in [0, 1]
    pub roughness: f32,
    /// Metalness in [0, 1]
    pub metallic: f32,
    /// Optional albedo texture path
    pub albedo_texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            roughness: 0.5,
            metallic: 0.0,
            albedo_texture: None,
        }
    }
}

impl Material {
    /// Parse a material from RON text
    pub fn from_ron(source: &str, origin: &str) -> ResourceResult<Self> {
        ron::from_str(source).map_err(|e| ResourceError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Write the material as RON
    pub fn save_to_file(&self, path: &Path) -> ResourceResult<()> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ResourceError::Metadata(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl Resource for Material {
    const KIND: ResourceKind = ResourceKind::Material;

    fn load_from_file(path: &Path) -> ResourceResult<Self> {
        let name = path.display().to_string();
        if !super::is_supported_material_file(&name) {
            return Err(ResourceError::Unsupported(name));
        }
        let material = Self::from_ron(&std::fs::read_to_string(path)?, &name)?;
        log::debug!("Loaded material '{}' from {}", material.name, name);
        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_material_uses_defaults() {
        let material = Material::from_ron("(name: \"Brick\", roughness: 0.9)", "brick.ron").unwrap();
        assert_eq!(material.name, "Brick");
        assert_eq!(material.roughness, 0.9);
        assert_eq!(material.base_color, Material::default().base_color);
    }

    #[test]
    fn test_malformed_material_is_a_parse_error() {
        assert!(matches!(
            Material::from_ron("(roughness: \"high\")", "bad.ron"),
            Err(ResourceError::Parse { .. })
        ));
    }
}
