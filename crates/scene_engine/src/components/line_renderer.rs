//! Line renderer component
//!
//! Collects coloured line segments (debug geometry, bounds, gizmos) and owns
//! the dynamic vertex buffer they are uploaded to. Vertices are transient
//! and are not written to scene files.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec3, Vec4};
use crate::io::{FileStream, StreamResult};
use crate::render::GpuBuffer;
use crate::resources::BoundingBox;

use super::{Component, ComponentKind, ComponentType};

/// Position + colour vertex used for line lists
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexPosCol {
    /// Position in the owner's object space
    pub position: [f32; 3],
    /// RGBA colour
    pub color: [f32; 4],
}

impl VertexPosCol {
    /// Create a vertex
    pub fn new(position: Vec3, color: Vec4) -> Self {
        Self { position: position.into(), color: color.into() }
    }
}

/// Pairs of vertices forming independent line segments
#[derive(Debug, Default)]
pub struct LineRenderer {
    vertices: Vec<VertexPosCol>,
    dirty: bool,
    gpu: Option<GpuBuffer>,
}

/// Corner index pairs of the twelve box edges, see [`BoundingBox::corners`]
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

impl LineRenderer {
    /// Add one segment
    pub fn add_line(&mut self, from: Vec3, to: Vec3, color: Vec4) {
        self.add_vertex(VertexPosCol::new(from, color));
        self.add_vertex(VertexPosCol::new(to, color));
    }

    /// Add the twelve edges of a box
    pub fn add_bounding_box(&mut self, bounds: &BoundingBox, color: Vec4) {
        let corners = bounds.corners();
        for (a, b) in BOX_EDGES {
            self.add_line(corners[a], corners[b], color);
        }
    }

    /// Append pre-built vertices; an odd total leaves the last one unused
    pub fn add_lines(&mut self, vertices: &[VertexPosCol]) {
        self.vertices.extend_from_slice(vertices);
        self.dirty = true;
    }

    /// Append a single vertex
    pub fn add_vertex(&mut self, vertex: VertexPosCol) {
        self.vertices.push(vertex);
        self.dirty = true;
    }

    /// Remove every vertex
    pub fn clear_vertices(&mut self) {
        if !self.vertices.is_empty() {
            self.vertices.clear();
            self.dirty = true;
        }
    }

    /// Current vertices
    pub fn vertices(&self) -> &[VertexPosCol] {
        &self.vertices
    }

    /// Vertices that form complete segments
    pub fn vertex_count(&self) -> u32 {
        u32::try_from(self.vertices.len() & !1).unwrap_or(u32::MAX & !1)
    }

    /// Whether the vertices changed since the last upload
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dynamic buffer, once uploaded
    pub fn gpu_buffer(&self) -> Option<&GpuBuffer> {
        self.gpu.as_ref()
    }

    /// Store a freshly created buffer and mark the vertices uploaded
    pub fn set_gpu_buffer(&mut self, buffer: GpuBuffer) {
        self.gpu = Some(buffer);
        self.dirty = false;
    }

    /// Mark the vertices uploaded into the existing buffer
    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }
}

impl Component for LineRenderer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::LineRenderer
    }

    fn on_disable(&mut self) {
        self.clear_vertices();
    }

    fn serialize(&self, _stream: &mut FileStream) {}

    fn deserialize(&mut self, _stream: &mut FileStream) -> StreamResult<()> {
        Ok(())
    }

    component_any!();
}

impl ComponentType for LineRenderer {
    const KIND: ComponentKind = ComponentKind::LineRenderer;
}
