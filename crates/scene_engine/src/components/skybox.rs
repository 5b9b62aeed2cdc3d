//! Skybox component - six face textures drawn behind everything else

use std::sync::Arc;

use crate::io::{FileStream, StreamError, StreamResult};
use crate::render::GpuTexture;
use crate::resources::{ResourceManager, Texture};

use super::{Component, ComponentKind, ComponentType};

/// Faces of a cube map: +X, -X, +Y, -Y, +Z, -Z
pub const CUBE_FACES: usize = 6;

/// Environment cube
#[derive(Debug, Default)]
pub struct Skybox {
    faces: Vec<String>,
    textures: Vec<Arc<Texture>>,
    cube: Option<GpuTexture>,
}

impl Skybox {
    /// Assign the six face texture paths; drops any bound textures
    pub fn set_faces(&mut self, faces: [String; CUBE_FACES]) {
        self.faces = faces.into();
        self.textures.clear();
        self.cube = None;
    }

    /// Face paths, empty when none were assigned
    pub fn faces(&self) -> &[String] {
        &self.faces
    }

    /// Bind already loaded face textures
    pub fn set_face_textures(&mut self, textures: [Arc<Texture>; CUBE_FACES]) {
        self.textures = textures.into();
        self.cube = None;
    }

    /// Whether all six faces are bound
    pub fn has_face_textures(&self) -> bool {
        self.textures.len() == CUBE_FACES
    }

    /// Face size and the six faces' pixels back to back, when all faces are
    /// bound and equally sized
    pub fn cube_pixels(&self) -> Option<(u32, u32, Vec<u8>)> {
        let first = self.textures.first()?;
        let size = (first.width(), first.height());
        if !self.has_face_textures() || self.textures.iter().any(|t| (t.width(), t.height()) != size) {
            return None;
        }
        let pixels = self.textures.iter().flat_map(|t| t.pixels().iter().copied()).collect();
        Some((size.0, size.1, pixels))
    }

    /// Uploaded cube texture
    pub fn cube_texture(&self) -> Option<&GpuTexture> {
        self.cube.as_ref()
    }

    /// Store the cube texture created by the renderer
    pub fn set_cube_texture(&mut self, texture: GpuTexture) {
        self.cube = Some(texture);
    }
}

impl Component for Skybox {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Skybox
    }

    fn serialize(&self, stream: &mut FileStream) {
        stream.write_strings(&self.faces);
    }

    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()> {
        let faces = stream.read_strings()?;
        if !faces.is_empty() && faces.len() != CUBE_FACES {
            return Err(StreamError::InvalidValue(format!("skybox with {} faces", faces.len())));
        }
        self.faces = faces;
        self.textures.clear();
        self.cube = None;
        Ok(())
    }

    fn bind_resources(&mut self, resources: &mut ResourceManager) {
        if self.faces.is_empty() || self.has_face_textures() {
            return;
        }
        let loaded: Result<Vec<_>, _> = self.faces.iter().map(|face| resources.load::<Texture>(face)).collect();
        match loaded {
            Ok(textures) => self.textures = textures,
            Err(e) => log::warn!("Skybox faces could not be bound: {}", e),
        }
    }

    component_any!();
}

impl ComponentType for Skybox {
    const KIND: ComponentKind = ComponentKind::Skybox;
}
