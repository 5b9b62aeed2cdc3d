//! Mesh renderer component - how a mesh is shaded

use std::sync::Arc;

use crate::io::{FileStream, StreamResult};
use crate::resources::{Material, ResourceManager};

use super::{Component, ComponentKind, ComponentType};

/// Material binding and shadow flags of a renderable
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    material_path: Option<String>,
    material: Arc<Material>,
    cast_shadows: bool,
    receive_shadows: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            material_path: None,
            material: Arc::new(Material::default()),
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

impl MeshRenderer {
    /// Bound material; the default material when none was assigned
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Path of the assigned material resource
    pub fn material_path(&self) -> Option<&str> {
        self.material_path.as_deref()
    }

    /// Assign a loaded material
    pub fn set_material(&mut self, path: impl Into<String>, material: Arc<Material>) {
        self.material_path = Some(path.into());
        self.material = material;
    }

    /// Revert to the default material
    pub fn use_default_material(&mut self) {
        self.material_path = None;
        self.material = Arc::new(Material::default());
    }

    /// Whether the mesh casts shadows
    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    /// Enable or disable shadow casting
    pub fn set_cast_shadows(&mut self, enabled: bool) {
        self.cast_shadows = enabled;
    }

    /// Whether the mesh receives shadows
    pub fn receive_shadows(&self) -> bool {
        self.receive_shadows
    }

    /// Enable or disable shadow receiving
    pub fn set_receive_shadows(&mut self, enabled: bool) {
        self.receive_shadows = enabled;
    }
}

impl Component for MeshRenderer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::MeshRenderer
    }

    fn serialize(&self, stream: &mut FileStream) {
        // Empty path stands for the default material
        stream.write_str(self.material_path.as_deref().unwrap_or_default());
        stream.write_bool(self.cast_shadows);
        stream.write_bool(self.receive_shadows);
    }

    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()> {
        let path = stream.read_str()?;
        self.material_path = (!path.is_empty()).then_some(path);
        self.material = Arc::new(Material::default());
        self.cast_shadows = stream.read_bool()?;
        self.receive_shadows = stream.read_bool()?;
        Ok(())
    }

    fn bind_resources(&mut self, resources: &mut ResourceManager) {
        let Some(path) = &self.material_path else {
            return;
        };
        match resources.load::<Material>(path) {
            Ok(material) => self.material = material,
            Err(e) => log::warn!("Material {} could not be bound, using default: {}", path, e),
        }
    }

    component_any!();
}

impl ComponentType for MeshRenderer {
    const KIND: ComponentKind = ComponentKind::MeshRenderer;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ResourceConfig;

    #[test]
    fn test_material_is_bound_after_deserialize() {
        let mut resources = ResourceManager::new(ResourceConfig::default());
        let red = Material { name: "Red".to_string(), base_color: [1.0, 0.0, 0.0, 1.0], ..Material::default() };
        let red = resources.insert("materials/red.ron", red);

        let mut original = MeshRenderer::default();
        original.set_material("materials/red.ron", red);
        original.set_cast_shadows(false);

        let mut stream = FileStream::new();
        original.serialize(&mut stream);
        let mut restored = MeshRenderer::default();
        restored.deserialize(&mut FileStream::from_bytes(stream.into_bytes())).unwrap();
        assert_eq!(restored.material().name, "Default");

        restored.bind_resources(&mut resources);
        assert_eq!(restored.material().name, "Red");
        assert_eq!(restored.material_path(), Some("materials/red.ron"));
        assert!(!restored.cast_shadows());
    }
}
