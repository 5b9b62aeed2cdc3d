//! Graphics device abstraction
//!
//! This trait is the boundary to the graphics API. Resources are referred
//! to by opaque ids; the renderer wraps them in owning handles.

use super::RenderResult;

/// Opaque id of a device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Opaque id of a device texture or render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// How a buffer will be bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Immutable vertex data
    Vertex,
    /// Immutable index data
    Index,
    /// Vertex data rewritten from the CPU
    DynamicVertex,
    /// Shader constants
    Constant,
}

/// Passes of a frame, in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Depth-only pre-pass
    Depth,
    /// Shaded pass
    Lighting,
}

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Independent triangles
    TriangleList,
    /// Independent line segments
    LineList,
}

/// Operations the renderer needs from the graphics API
pub trait RenderDevice: Send {
    /// Human readable device name
    fn name(&self) -> &str;

    /// Create a buffer initialised with `data`
    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> RenderResult<BufferId>;

    /// Overwrite a buffer's contents; `data` must fit its allocation
    fn update_buffer(&mut self, buffer: BufferId, data: &[u8]) -> RenderResult<()>;

    /// Free a buffer
    fn release_buffer(&mut self, buffer: BufferId);

    /// Create an RGBA8 texture with `layers` equally sized layers (6 for a cube)
    fn create_texture(&mut self, width: u32, height: u32, layers: u32, pixels: &[u8]) -> RenderResult<TextureId>;

    /// Create a colour + depth render target that can also be sampled
    fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<TextureId>;

    /// Free a texture or render target
    fn release_texture(&mut self, texture: TextureId);

    /// Open a pass writing to `target`
    fn begin_pass(&mut self, pass: PassKind, target: TextureId, clear_color: Option<[f32; 4]>) -> RenderResult<()>;

    /// Bind a constant buffer for subsequent draws
    fn bind_constant_buffer(&mut self, slot: u32, buffer: BufferId) -> RenderResult<()>;

    /// Bind a texture for subsequent draws
    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> RenderResult<()>;

    /// Indexed draw
    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
        topology: Topology,
    ) -> RenderResult<()>;

    /// Non-indexed draw
    fn draw(&mut self, vertices: BufferId, vertex_count: u32, topology: Topology) -> RenderResult<()>;

    /// Close the open pass
    fn end_pass(&mut self) -> RenderResult<()>;

    /// Fill a render target with a colour outside of any pass
    fn clear_target(&mut self, target: TextureId, color: [f32; 4]) -> RenderResult<()>;

    /// Resolve the finished frame so it can be sampled by the host UI
    fn present(&mut self, target: TextureId) -> RenderResult<()>;
}
