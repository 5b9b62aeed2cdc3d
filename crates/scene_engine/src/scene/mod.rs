//! Scene graph
//!
//! The [`Scene`] owns every [`GameObject`] in a slot-map arena. Hierarchy
//! links between objects are arena keys, and the camera, skybox, renderable
//! and light sets are key lists rebuilt by [`Scene::resolve`] after every
//! structural change.

mod game_object;
mod picking;
#[allow(clippy::module_inception)]
mod scene;
mod serialization;
mod tasks;
pub mod transform;

pub use game_object::{GameObject, GameObjectFlags, GameObjectKey};
pub use picking::{pick_nearest, BoundingSphere, Ray};
pub use scene::Scene;
pub use serialization::{GameObjectRecord, SceneSnapshot, SCENE_FILE_MAGIC, SCENE_FILE_VERSION};
pub use tasks::{SceneTask, SharedScene, TaskQueue};
pub use transform::Transform;

use std::path::PathBuf;
use thiserror::Error;

use crate::io::StreamError;

/// Arena holding a scene's game objects
pub type GameObjects = slotmap::SlotMap<GameObjectKey, GameObject>;

/// Errors raised by scene file operations
#[derive(Error, Debug)]
pub enum SceneError {
    /// Reading or writing the scene file failed
    #[error("Scene I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No scene file at the given path
    #[error("Scene file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file is not a well-formed scene
    #[error("Malformed scene file: {0}")]
    Format(String),

    /// The file was written by an incompatible format version
    #[error("Unsupported scene format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version stored in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// The background worker stopped before finishing the task
    #[error("Scene task worker is no longer running")]
    WorkerGone,
}

impl From<StreamError> for SceneError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Io(e) => Self::Io(e),
            other => Self::Format(other.to_string()),
        }
    }
}

/// Result type for scene file operations
pub type SceneResult<T> = Result<T, SceneError>;
