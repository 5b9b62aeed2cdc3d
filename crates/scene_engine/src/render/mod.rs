//! Rendering module
//!
//! The [`Renderer`] consumes a resolved [`crate::scene::Scene`] and drives a
//! fixed pass sequence through a [`RenderDevice`]:
//!
//! 1. depth pre-pass over every renderable
//! 2. lighting pass: lit renderables, line lists, then the skybox
//! 3. present into the frame target
//!
//! The device is the graphics API boundary. GPU objects it creates are
//! wrapped in RAII handles ([`GpuBuffer`], [`GpuTexture`]) owned by the
//! component that asked for them; dropping a handle queues its release and
//! the renderer hands the queue to the device at the next safe point.

mod constants;
mod device;
mod gpu;
mod recording;
mod renderer;

pub use constants::{
    ConstantBuffer, FrameConstants, GpuDirectionalLight, GpuPointLight, LightConstants, ObjectConstants,
    MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS,
};
pub use device::{BufferId, BufferUsage, PassKind, RenderDevice, TextureId, Topology};
pub use gpu::{GpuBuffer, GpuMesh, GpuRelease, GpuTexture, ReleaseQueue};
pub use recording::{DeviceCall, DeviceLog, RecordingDevice};
pub use renderer::{
    FrameStats, Renderer, FRAME_CONSTANTS_SLOT, LIGHT_CONSTANTS_SLOT, OBJECT_CONSTANTS_SLOT, SKYBOX_TEXTURE_SLOT,
};

use thiserror::Error;

/// Errors that can occur during rendering operations
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    ///
    /// Raised for pass misuse such as drawing outside a pass or beginning a
    /// pass while another one is open.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A handle that was never created or was already released was used
    #[error("Stale GPU handle: {0}")]
    StaleHandle(String),

    /// Requested frame size is zero or larger than the device supports
    #[error("Invalid resolution {width}x{height} (maximum {max})")]
    InvalidResolution {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Largest accepted dimension
        max: u32,
    },

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
