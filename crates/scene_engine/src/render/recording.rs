//! Headless device that records every call
//!
//! Used by tests, the demo binary and tooling that needs a scene to be
//! "rendered" without a GPU. Misuse that a real API would reject (drawing
//! outside a pass, using a released id) is reported as an error.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::device::{BufferId, BufferUsage, PassKind, RenderDevice, TextureId, Topology};
use super::{RenderError, RenderResult};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// Buffer created
    CreateBuffer {
        /// New id
        id: BufferId,
        /// Bind usage
        usage: BufferUsage,
        /// Size in bytes
        size: usize,
    },
    /// Buffer contents replaced
    UpdateBuffer {
        /// Target buffer
        id: BufferId,
        /// Bytes written
        size: usize,
    },
    /// Buffer freed
    ReleaseBuffer(BufferId),
    /// Texture created
    CreateTexture {
        /// New id
        id: TextureId,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
        /// Layer count
        layers: u32,
    },
    /// Render target created
    CreateRenderTarget {
        /// New id
        id: TextureId,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Texture freed
    ReleaseTexture(TextureId),
    /// Pass opened
    BeginPass(PassKind),
    /// Constant buffer bound
    BindConstantBuffer {
        /// Slot
        slot: u32,
        /// Buffer
        id: BufferId,
    },
    /// Texture bound
    BindTexture {
        /// Slot
        slot: u32,
        /// Texture
        id: TextureId,
    },
    /// Indexed draw
    DrawIndexed {
        /// Vertex buffer
        vertices: BufferId,
        /// Index buffer
        indices: BufferId,
        /// Index count
        count: u32,
    },
    /// Non-indexed draw
    Draw {
        /// Vertex buffer
        vertices: BufferId,
        /// Vertex count
        count: u32,
        /// Topology
        topology: Topology,
    },
    /// Pass closed
    EndPass,
    /// Target cleared outside a pass
    ClearTarget(TextureId),
    /// Frame presented
    Present(TextureId),
}

/// Shared view of a [`RecordingDevice`]'s call log
#[derive(Debug, Clone, Default)]
pub struct DeviceLog(Arc<Mutex<Vec<DeviceCall>>>);

impl DeviceLog {
    /// Snapshot of every recorded call
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.0.lock().clone()
    }

    /// Forget recorded calls
    pub fn clear(&self) {
        self.0.lock().clear();
    }

    /// Number of calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.0.lock().iter().filter(|call| predicate(call)).count()
    }

    /// Whether `call` was recorded
    pub fn contains(&self, call: &DeviceCall) -> bool {
        self.0.lock().contains(call)
    }

    fn push(&self, call: DeviceCall) {
        self.0.lock().push(call);
    }
}

/// Device that validates and records calls instead of talking to a GPU
#[derive(Debug, Default)]
pub struct RecordingDevice {
    log: DeviceLog,
    next_id: u64,
    buffers: HashMap<BufferId, usize>,
    textures: HashSet<TextureId>,
    open_pass: Option<PassKind>,
}

impl RecordingDevice {
    /// Create a device with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the call log; stays valid after the device is boxed
    pub fn log(&self) -> DeviceLog {
        self.log.clone()
    }

    /// Buffers currently alive
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_buffer(&self, id: BufferId) -> RenderResult<usize> {
        self.buffers
            .get(&id)
            .copied()
            .ok_or_else(|| RenderError::StaleHandle(format!("{id:?}")))
    }

    fn check_texture(&self, id: TextureId) -> RenderResult<()> {
        if self.textures.contains(&id) {
            Ok(())
        } else {
            Err(RenderError::StaleHandle(format!("{id:?}")))
        }
    }

    fn require_pass(&self, operation: &str) -> RenderResult<()> {
        if self.open_pass.is_none() {
            return Err(RenderError::RenderingFailed(format!("{operation} outside of a pass")));
        }
        Ok(())
    }
}

impl RenderDevice for RecordingDevice {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> RenderResult<BufferId> {
        if data.is_empty() {
            return Err(RenderError::ResourceCreationFailed("zero-sized buffer".to_string()));
        }
        let id = BufferId(self.allocate_id());
        self.buffers.insert(id, data.len());
        self.log.push(DeviceCall::CreateBuffer { id, usage, size: data.len() });
        Ok(id)
    }

    fn update_buffer(&mut self, buffer: BufferId, data: &[u8]) -> RenderResult<()> {
        let capacity = self.check_buffer(buffer)?;
        if data.len() > capacity {
            return Err(RenderError::RenderingFailed(format!(
                "update of {} bytes overflows {:?} ({} bytes)",
                data.len(),
                buffer,
                capacity
            )));
        }
        self.log.push(DeviceCall::UpdateBuffer { id: buffer, size: data.len() });
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("Release of unknown buffer {:?}", buffer);
        }
        self.log.push(DeviceCall::ReleaseBuffer(buffer));
    }

    fn create_texture(&mut self, width: u32, height: u32, layers: u32, pixels: &[u8]) -> RenderResult<TextureId> {
        let expected = width as usize * height as usize * layers as usize * 4;
        if width == 0 || height == 0 || layers == 0 || pixels.len() != expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture {width}x{height}x{layers} with {} bytes of pixels",
                pixels.len()
            )));
        }
        let id = TextureId(self.allocate_id());
        self.textures.insert(id);
        self.log.push(DeviceCall::CreateTexture { id, width, height, layers });
        Ok(id)
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<TextureId> {
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceCreationFailed("zero-sized render target".to_string()));
        }
        let id = TextureId(self.allocate_id());
        self.textures.insert(id);
        self.log.push(DeviceCall::CreateRenderTarget { id, width, height });
        Ok(id)
    }

    fn release_texture(&mut self, texture: TextureId) {
        if !self.textures.remove(&texture) {
            log::warn!("Release of unknown texture {:?}", texture);
        }
        self.log.push(DeviceCall::ReleaseTexture(texture));
    }

    fn begin_pass(&mut self, pass: PassKind, target: TextureId, _clear_color: Option<[f32; 4]>) -> RenderResult<()> {
        if let Some(open) = self.open_pass {
            return Err(RenderError::RenderingFailed(format!("{pass:?} pass begun while {open:?} is open")));
        }
        self.check_texture(target)?;
        self.open_pass = Some(pass);
        self.log.push(DeviceCall::BeginPass(pass));
        Ok(())
    }

    fn bind_constant_buffer(&mut self, slot: u32, buffer: BufferId) -> RenderResult<()> {
        self.require_pass("constant buffer bind")?;
        self.check_buffer(buffer)?;
        self.log.push(DeviceCall::BindConstantBuffer { slot, id: buffer });
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> RenderResult<()> {
        self.require_pass("texture bind")?;
        self.check_texture(texture)?;
        self.log.push(DeviceCall::BindTexture { slot, id: texture });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
        _topology: Topology,
    ) -> RenderResult<()> {
        self.require_pass("draw")?;
        self.check_buffer(vertices)?;
        self.check_buffer(indices)?;
        self.log.push(DeviceCall::DrawIndexed { vertices, indices, count: index_count });
        Ok(())
    }

    fn draw(&mut self, vertices: BufferId, vertex_count: u32, topology: Topology) -> RenderResult<()> {
        self.require_pass("draw")?;
        self.check_buffer(vertices)?;
        self.log.push(DeviceCall::Draw { vertices, count: vertex_count, topology });
        Ok(())
    }

    fn end_pass(&mut self) -> RenderResult<()> {
        if self.open_pass.take().is_none() {
            return Err(RenderError::RenderingFailed("end of pass with no pass open".to_string()));
        }
        self.log.push(DeviceCall::EndPass);
        Ok(())
    }

    fn clear_target(&mut self, target: TextureId, _color: [f32; 4]) -> RenderResult<()> {
        self.check_texture(target)?;
        self.log.push(DeviceCall::ClearTarget(target));
        Ok(())
    }

    fn present(&mut self, target: TextureId) -> RenderResult<()> {
        if self.open_pass.is_some() {
            return Err(RenderError::RenderingFailed("present with a pass open".to_string()));
        }
        self.check_texture(target)?;
        self.log.push(DeviceCall::Present(target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_outside_pass_is_rejected() {
        let mut device = RecordingDevice::new();
        let buffer = device.create_buffer(BufferUsage::Vertex, &[0; 12]).unwrap();
        assert!(device.draw(buffer, 1, Topology::LineList).is_err());
    }

    #[test]
    fn test_released_buffer_is_stale() {
        let mut device = RecordingDevice::new();
        let target = device.create_render_target(4, 4).unwrap();
        let buffer = device.create_buffer(BufferUsage::Vertex, &[0; 12]).unwrap();
        device.release_buffer(buffer);

        device.begin_pass(PassKind::Lighting, target, None).unwrap();
        assert!(matches!(
            device.draw(buffer, 1, Topology::TriangleList),
            Err(RenderError::StaleHandle(_))
        ));
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_log_outlives_boxing() {
        let device = RecordingDevice::new();
        let log = device.log();
        let mut boxed: Box<dyn RenderDevice> = Box::new(device);
        boxed.create_render_target(8, 8).unwrap();
        assert_eq!(log.count(|call| matches!(call, DeviceCall::CreateRenderTarget { .. })), 1);
    }
}
