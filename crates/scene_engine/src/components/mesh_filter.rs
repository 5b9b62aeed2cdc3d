//! Mesh filter component - which mesh an object draws
//!
//! Owns the GPU copy of its mesh once the renderer has uploaded it. Changing
//! the mesh drops the old buffers, which queues their release.

use std::sync::Arc;

use crate::io::{FileStream, StreamError, StreamResult};
use crate::render::GpuMesh;
use crate::resources::{BoundingBox, Mesh, Primitive, ResourceManager};

use super::{Component, ComponentKind, ComponentType};

/// Where a mesh filter's mesh comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshSource {
    /// No mesh assigned
    None,
    /// Generated primitive
    Primitive(Primitive),
    /// Mesh resource loaded from this path
    Resource(String),
}

/// Mesh data of a renderable
#[derive(Debug)]
pub struct MeshFilter {
    source: MeshSource,
    mesh: Option<Arc<Mesh>>,
    gpu: Option<GpuMesh>,
}

impl Default for MeshFilter {
    fn default() -> Self {
        Self { source: MeshSource::None, mesh: None, gpu: None }
    }
}

impl MeshFilter {
    /// Use a generated primitive
    pub fn set_primitive(&mut self, primitive: Primitive) {
        self.source = MeshSource::Primitive(primitive);
        self.mesh = Some(Arc::new(primitive.mesh()));
        self.gpu = None;
    }

    /// Use a loaded mesh resource
    pub fn set_mesh(&mut self, path: impl Into<String>, mesh: Arc<Mesh>) {
        self.source = MeshSource::Resource(path.into());
        self.mesh = Some(mesh);
        self.gpu = None;
    }

    /// Mesh origin
    pub fn source(&self) -> &MeshSource {
        &self.source
    }

    /// CPU mesh, if bound
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Object-space bounds of the mesh; empty when no mesh is bound
    pub fn bounding_box(&self) -> BoundingBox {
        self.mesh.as_ref().map(|mesh| mesh.bounding_box()).unwrap_or_default()
    }

    /// Uploaded buffers, if the renderer has drawn this mesh
    pub fn gpu_mesh(&self) -> Option<&GpuMesh> {
        self.gpu.as_ref()
    }

    /// Store buffers uploaded by the renderer
    pub fn set_gpu_mesh(&mut self, gpu: GpuMesh) {
        self.gpu = Some(gpu);
    }

    /// Drop the uploaded buffers
    pub fn release_gpu_mesh(&mut self) {
        self.gpu = None;
    }
}

impl Component for MeshFilter {
    fn kind(&self) -> ComponentKind {
        ComponentKind::MeshFilter
    }

    fn serialize(&self, stream: &mut FileStream) {
        match &self.source {
            MeshSource::None => stream.write_u32(0),
            MeshSource::Primitive(primitive) => {
                stream.write_u32(1);
                stream.write_u32(primitive.tag());
            }
            MeshSource::Resource(path) => {
                stream.write_u32(2);
                stream.write_str(path);
            }
        }
    }

    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()> {
        match stream.read_u32()? {
            0 => *self = Self::default(),
            1 => {
                let tag = stream.read_u32()?;
                let primitive = Primitive::from_tag(tag)
                    .ok_or_else(|| StreamError::InvalidValue(format!("primitive tag {tag}")))?;
                self.set_primitive(primitive);
            }
            2 => {
                self.source = MeshSource::Resource(stream.read_str()?);
                self.mesh = None;
                self.gpu = None;
            }
            other => return Err(StreamError::InvalidValue(format!("mesh source tag {other}"))),
        }
        Ok(())
    }

    fn bind_resources(&mut self, resources: &mut ResourceManager) {
        let MeshSource::Resource(path) = &self.source else {
            return;
        };
        if self.mesh.is_some() {
            return;
        }
        match resources.load::<Mesh>(path) {
            Ok(mesh) => self.mesh = Some(mesh),
            Err(e) => log::warn!("Mesh {} could not be bound: {}", path, e),
        }
    }

    component_any!();
}

impl ComponentType for MeshFilter {
    const KIND: ComponentKind = ComponentKind::MeshFilter;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ResourceConfig;

    #[test]
    fn test_primitive_is_rebuilt_on_deserialize() {
        let mut filter = MeshFilter::default();
        filter.set_primitive(Primitive::Sphere);

        let mut stream = FileStream::new();
        filter.serialize(&mut stream);
        let mut restored = MeshFilter::default();
        restored.deserialize(&mut FileStream::from_bytes(stream.into_bytes())).unwrap();

        assert_eq!(restored.source(), &MeshSource::Primitive(Primitive::Sphere));
        assert_eq!(restored.bounding_box(), filter.bounding_box());
    }

    #[test]
    fn test_resource_mesh_is_bound_from_cache() {
        let mut resources = ResourceManager::new(ResourceConfig::default());
        resources.insert("models/box.obj", Mesh::cube());

        let mut stream = FileStream::new();
        stream.write_u32(2);
        stream.write_str("models/box.obj");
        let mut filter = MeshFilter::default();
        filter.deserialize(&mut FileStream::from_bytes(stream.into_bytes())).unwrap();
        assert!(filter.mesh().is_none());

        filter.bind_resources(&mut resources);
        assert_eq!(filter.mesh().map(|m| m.index_count()), Some(36));
    }

    #[test]
    fn test_missing_resource_leaves_filter_unbound() {
        let dir = tempfile::tempdir().unwrap();
        let mut resources = ResourceManager::new(ResourceConfig::new().with_root_dir(dir.path()));
        let mut filter = MeshFilter::default();
        filter.source = MeshSource::Resource("nowhere.obj".to_string());
        filter.bind_resources(&mut resources);
        assert!(filter.mesh().is_none());
        assert_eq!(filter.bounding_box(), BoundingBox::default());
    }
}
