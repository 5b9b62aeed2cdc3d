//! Resource management
//!
//! CPU-side resources loaded from disk and shared between components through
//! `Arc`. The [`ResourceManager`] caches every resource by path so a scene
//! file can record which resources were live when it was saved.
//!
//! GPU copies of these resources are never created here; the renderer
//! uploads them on first use and the owning component keeps the handle.

mod manager;
mod material;
mod mesh;
mod script;
mod texture;

pub use manager::{ResourceManager, ResourceMetadata};
pub use material::Material;
pub use mesh::{BoundingBox, Mesh, Primitive, Vertex};
pub use script::ScriptAsset;
pub use texture::Texture;

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::path::Path;
use thiserror::Error;

/// Categories of resources, each with its own directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Triangle meshes
    Mesh,
    /// Surface materials
    Material,
    /// Images
    Texture,
    /// Script sources
    Script,
}

/// Resource loading errors
#[derive(Error, Debug)]
pub enum ResourceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was read but its contents could not be parsed
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Offending file
        path: String,
        /// Parser message
        message: String,
    },

    /// The file's extension is not handled by the requested resource type
    #[error("Unsupported resource file: {0}")]
    Unsupported(String),

    /// The path is cached as a different resource type
    #[error("Resource {path} is cached as {cached:?}, requested {requested:?}")]
    TypeMismatch {
        /// Cached path
        path: String,
        /// Kind already stored under this path
        cached: ResourceKind,
        /// Kind that was requested
        requested: ResourceKind,
    },

    /// Image decoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Metadata could not be serialized
    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

/// A resource that can be loaded from a file and cached by path
pub trait Resource: Any + Send + Sync + Sized {
    /// Category of this resource
    const KIND: ResourceKind;

    /// Load the resource from disk
    fn load_from_file(path: &Path) -> ResourceResult<Self>;
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|candidate| candidate.eq_ignore_ascii_case(e)))
}

/// Whether `path` names a mesh file the engine can load
pub fn is_supported_mesh_file(path: &str) -> bool {
    has_extension(path, &["obj"])
}

/// Whether `path` names a material file the engine can load
pub fn is_supported_material_file(path: &str) -> bool {
    has_extension(path, &["ron", "material"])
}

/// Whether `path` names an image file the engine can load
pub fn is_supported_image_file(path: &str) -> bool {
    has_extension(path, &["png"])
}

/// Whether `path` names a script source file
pub fn is_supported_script_file(path: &str) -> bool {
    has_extension(path, &["script"])
}

/// Classify a path by extension
pub fn kind_of_file(path: &str) -> Option<ResourceKind> {
    if is_supported_mesh_file(path) {
        Some(ResourceKind::Mesh)
    } else if is_supported_material_file(path) {
        Some(ResourceKind::Material)
    } else if is_supported_image_file(path) {
        Some(ResourceKind::Texture)
    } else if is_supported_script_file(path) {
        Some(ResourceKind::Script)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_classification() {
        assert!(is_supported_mesh_file("models/teapot.OBJ"));
        assert!(is_supported_material_file("materials/brick.ron"));
        assert!(is_supported_image_file("textures/sky_px.png"));
        assert!(!is_supported_image_file("textures/sky_px.jpg"));
        assert_eq!(kind_of_file("scripts/MouseLook.script"), Some(ResourceKind::Script));
        assert_eq!(kind_of_file("readme.txt"), None);
        assert_eq!(kind_of_file("no_extension"), None);
    }
}
