//! RGBA8 textures decoded with the `image` crate

use std::path::Path;

use super::{Resource, ResourceError, ResourceKind, ResourceResult};

/// Decoded image ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Wrap raw RGBA8 pixels
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == (width as usize) * (height as usize) * 4).then_some(Self { width, height, pixels })
    }

    /// Single-colour texture, handy as a fallback
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color.repeat((width as usize) * (height as usize));
        Self { width, height, pixels }
    }

    /// Decode an encoded image held in memory
    pub fn from_bytes(bytes: &[u8]) -> ResourceResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self { width, height, pixels: rgba.into_raw() })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 pixels, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl Resource for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn load_from_file(path: &Path) -> ResourceResult<Self> {
        let name = path.display().to_string();
        if !super::is_supported_image_file(&name) {
            return Err(ResourceError::Unsupported(name));
        }
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Loaded texture {}x{} from {}", width, height, name);
        Ok(Self { width, height, pixels: rgba.into_raw() })
    }
}
