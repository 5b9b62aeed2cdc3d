//! Owning handles to device resources
//!
//! A handle belongs to exactly one component (or to the renderer itself).
//! Dropping it pushes a [`GpuRelease`] onto the renderer's queue; the
//! renderer forwards queued releases to the device between frames, so a
//! handle never needs a borrow of the device.

use super::device::{BufferId, BufferUsage, TextureId};

/// A device resource whose owner has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuRelease {
    /// Buffer to free
    Buffer(BufferId),
    /// Texture to free
    Texture(TextureId),
}

/// Sending side of the renderer's release queue
#[derive(Debug, Clone)]
pub struct ReleaseQueue(flume::Sender<GpuRelease>);

impl ReleaseQueue {
    /// Create a queue and the receiver the renderer drains
    pub fn new() -> (Self, flume::Receiver<GpuRelease>) {
        let (sender, receiver) = flume::unbounded();
        (Self(sender), receiver)
    }

    fn push(&self, release: GpuRelease) {
        // A closed queue means the renderer and its device are already gone
        if self.0.send(release).is_err() {
            log::trace!("Release queue closed, dropping {:?}", release);
        }
    }
}

/// Owned device buffer
#[derive(Debug)]
pub struct GpuBuffer {
    id: BufferId,
    usage: BufferUsage,
    size: usize,
    queue: ReleaseQueue,
}

impl GpuBuffer {
    /// Take ownership of a buffer created on the device
    pub fn new(id: BufferId, usage: BufferUsage, size: usize, queue: ReleaseQueue) -> Self {
        Self { id, usage, size, queue }
    }

    /// Device id
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Bind usage
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Allocation size in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.queue.push(GpuRelease::Buffer(self.id));
    }
}

/// Owned device texture or render target
#[derive(Debug)]
pub struct GpuTexture {
    id: TextureId,
    width: u32,
    height: u32,
    queue: ReleaseQueue,
}

impl GpuTexture {
    /// Take ownership of a texture created on the device
    pub fn new(id: TextureId, width: u32, height: u32, queue: ReleaseQueue) -> Self {
        Self { id, width, height, queue }
    }

    /// Device id
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.queue.push(GpuRelease::Texture(self.id));
    }
}

/// Vertex and index buffers of one uploaded mesh
#[derive(Debug)]
pub struct GpuMesh {
    /// Vertex buffer
    pub vertices: GpuBuffer,
    /// Index buffer
    pub indices: GpuBuffer,
    /// Number of indices to draw
    pub index_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_queues_release() {
        let (queue, receiver) = ReleaseQueue::new();
        {
            let _buffer = GpuBuffer::new(BufferId(3), BufferUsage::Vertex, 64, queue.clone());
            let _texture = GpuTexture::new(TextureId(9), 4, 4, queue.clone());
            assert!(receiver.is_empty());
        }
        let released: Vec<_> = receiver.try_iter().collect();
        // Locals drop in reverse declaration order
        assert_eq!(released, vec![GpuRelease::Texture(TextureId(9)), GpuRelease::Buffer(BufferId(3))]);
    }

    #[test]
    fn test_drop_after_queue_closed_is_silent() {
        let (queue, receiver) = ReleaseQueue::new();
        drop(receiver);
        drop(GpuBuffer::new(BufferId(1), BufferUsage::Index, 12, queue));
    }
}
