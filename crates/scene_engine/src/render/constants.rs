//! Per-frame shader constants
//!
//! Plain-old-data layouts uploaded through [`ConstantBuffer`]. Every field
//! is a 16-byte multiple so the structs match std140 packing without
//! explicit padding.

use bytemuck::{Pod, Zeroable};

use super::device::{BufferId, BufferUsage, RenderDevice};
use super::gpu::{GpuBuffer, ReleaseQueue};
use super::RenderResult;
use crate::foundation::math::{Mat4, Vec3};

/// Directional lights uploaded per frame
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Point and spot lights uploaded per frame
pub const MAX_POINT_LIGHTS: usize = 16;

/// Camera data shared by every draw of a frame
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameConstants {
    /// World to view
    pub view: [[f32; 4]; 4],
    /// View to clip
    pub projection: [[f32; 4]; 4],
    /// World to clip
    pub view_projection: [[f32; 4]; 4],
    /// Camera position, w unused
    pub camera_position: [f32; 4],
    /// Frame width, height, 1/width, 1/height
    pub resolution: [f32; 4],
}

impl FrameConstants {
    /// Pack camera matrices and the frame size
    pub fn new(view: &Mat4, projection: &Mat4, camera_position: &Vec3, width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self {
            view: (*view).into(),
            projection: (*projection).into(),
            view_projection: (projection * view).into(),
            camera_position: [camera_position.x, camera_position.y, camera_position.z, 1.0],
            resolution: [w, h, 1.0 / w, 1.0 / h],
        }
    }
}

/// Per-draw transform and material colour
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectConstants {
    /// Object to world
    pub world: [[f32; 4]; 4],
    /// Object to clip
    pub world_view_projection: [[f32; 4]; 4],
    /// Material base colour
    pub color: [f32; 4],
}

impl ObjectConstants {
    /// Pack one draw's matrices
    pub fn new(world: &Mat4, view_projection: &Mat4, color: [f32; 4]) -> Self {
        Self {
            world: (*world).into(),
            world_view_projection: (view_projection * world).into(),
            color,
        }
    }
}

/// One directional light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    /// World direction the light travels, w = intensity
    pub direction: [f32; 4],
    /// RGB colour, w = shadow bias
    pub color: [f32; 4],
}

/// One point or spot light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// World position, w = range
    pub position: [f32; 4],
    /// RGB colour, w = intensity
    pub color: [f32; 4],
}

/// Every light affecting a frame
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightConstants {
    /// Ambient RGB, w unused
    pub ambient: [f32; 4],
    /// x = directional count, y = point count
    pub counts: [u32; 4],
    /// Directional lights, first `counts[0]` valid
    pub directional: [GpuDirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    /// Point lights, first `counts[1]` valid
    pub point: [GpuPointLight; MAX_POINT_LIGHTS],
}

impl LightConstants {
    /// Pack lights, dropping any beyond the fixed capacity
    pub fn new(ambient: &Vec3, directional: &[GpuDirectionalLight], point: &[GpuPointLight]) -> Self {
        let mut constants = Self::zeroed();
        constants.ambient = [ambient.x, ambient.y, ambient.z, 0.0];

        let directional = &directional[..directional.len().min(MAX_DIRECTIONAL_LIGHTS)];
        let point = &point[..point.len().min(MAX_POINT_LIGHTS)];
        constants.directional[..directional.len()].copy_from_slice(directional);
        constants.point[..point.len()].copy_from_slice(point);
        constants.counts = [directional.len() as u32, point.len() as u32, 0, 0];
        constants
    }
}

/// CPU copy of a constant block plus its device buffer, created on first upload
#[derive(Debug)]
pub struct ConstantBuffer<T: Pod> {
    data: T,
    buffer: Option<GpuBuffer>,
}

impl<T: Pod> Default for ConstantBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod> ConstantBuffer<T> {
    /// Zero-initialised block with no device buffer yet
    pub fn new() -> Self {
        Self { data: T::zeroed(), buffer: None }
    }

    /// Replace the CPU copy
    pub fn set(&mut self, data: T) {
        self.data = data;
    }

    /// Current CPU copy
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Device buffer id, once uploaded
    pub fn buffer_id(&self) -> Option<BufferId> {
        self.buffer.as_ref().map(GpuBuffer::id)
    }

    /// Push the CPU copy to the device, creating the buffer if needed
    pub fn upload(&mut self, device: &mut dyn RenderDevice, queue: &ReleaseQueue) -> RenderResult<BufferId> {
        let bytes = bytemuck::bytes_of(&self.data);
        if let Some(buffer) = &self.buffer {
            device.update_buffer(buffer.id(), bytes)?;
            return Ok(buffer.id());
        }

        let id = device.create_buffer(BufferUsage::Constant, bytes)?;
        self.buffer = Some(GpuBuffer::new(id, BufferUsage::Constant, bytes.len(), queue.clone()));
        Ok(id)
    }

    /// Drop the device buffer; the next upload recreates it
    pub fn release(&mut self) {
        self.buffer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_are_std140_sized() {
        assert_eq!(std::mem::size_of::<FrameConstants>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectConstants>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightConstants>(), 32 + 32 * MAX_DIRECTIONAL_LIGHTS + 32 * MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_light_constants_clamp_to_capacity() {
        let light = GpuPointLight { position: [0.0; 4], color: [1.0; 4] };
        let constants = LightConstants::new(&Vec3::new(0.1, 0.1, 0.1), &[], &[light; 20]);
        assert_eq!(constants.counts, [0, MAX_POINT_LIGHTS as u32, 0, 0]);
        assert_eq!(constants.point[MAX_POINT_LIGHTS - 1], light);
    }
}
