//! # Scene Engine
//!
//! Scene graph and render pass core of a real-time 3D engine.
//!
//! ## Features
//!
//! - **Scene graph**: game objects in a slot-map arena with a transform hierarchy
//! - **Components**: cameras, lights, meshes, line lists, scripts and skyboxes
//! - **Render passes**: depth pre-pass, lighting pass and present through a
//!   pluggable [`render::RenderDevice`]
//! - **Scene files**: versioned binary save / load, optionally on a background worker
//! - **Picking**: screen-space ray casts against renderable bounds
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let subsystems = Subsystems::headless(&config)?;
//!     let mut scene = Scene::new(config.scene.clone(), subsystems);
//!     scene.initialize();
//!
//!     let cube = scene.create_game_object();
//!     if let Some(object) = scene.game_object_mut(cube) {
//!         if let Some(filter) = object.add_component::<MeshFilter>() {
//!             filter.set_primitive(Primitive::Cube);
//!         }
//!         object.add_component::<MeshRenderer>();
//!     }
//!     scene.resolve();
//!
//!     scene.update(Duration::from_millis(16));
//!     let renderer = scene.subsystems().renderer.clone();
//!     renderer.lock().render(&mut scene)?;
//!     scene.save_to_file("level")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod io;
pub mod components;
pub mod scene;
pub mod resources;
pub mod render;
pub mod subsystems;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        components::{
            Camera, Component, ComponentKind, ComponentType, Light, LightType, LineRenderer, MeshFilter,
            MeshRenderer, Projection, Script, Skybox,
        },
        config::Config,
        core::config::{EngineConfig, RendererConfig, ResourceConfig, SceneConfig},
        foundation::{
            math::{Mat4, Quat, Vec2, Vec3, Vec4},
            time::{FpsCounter, Stopwatch, Timer},
        },
        render::{RecordingDevice, RenderDevice, RenderError, Renderer},
        resources::{Material, Mesh, Primitive, ResourceKind, ResourceManager, Texture},
        scene::{
            GameObject, GameObjectKey, Scene, SceneError, SceneResult, SceneTask, SharedScene, TaskQueue,
            Transform,
        },
        subsystems::{NullPhysics, NullScripting, Physics, Scripting, Subsystems},
    };
}
