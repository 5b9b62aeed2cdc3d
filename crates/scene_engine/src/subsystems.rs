//! Engine subsystems consumed by the scene
//!
//! Physics and scripting are external runtimes reached through narrow
//! traits. The scene receives every collaborator at construction through
//! [`Subsystems`]; nothing is looked up globally.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::EngineConfig;
use crate::render::{RecordingDevice, RenderDevice, RenderResult, Renderer};
use crate::resources::ResourceManager;

/// Physics runtime
pub trait Physics: Send {
    /// Advance the simulation
    fn step(&mut self, delta: Duration);

    /// Drop every body and constraint
    fn reset(&mut self);
}

/// Scripting runtime
pub trait Scripting: Send {
    /// Run a script's start hook for `owner_id`
    fn invoke_start(&mut self, script: &str, owner_id: &str);

    /// Run a script's per-frame hook for `owner_id`
    fn invoke_update(&mut self, script: &str, owner_id: &str, delta: Duration);

    /// Unload every compiled script and its state
    fn reset(&mut self);
}

/// Physics that simulates nothing
#[derive(Debug, Default)]
pub struct NullPhysics {
    steps: u64,
}

impl NullPhysics {
    /// Steps taken since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Physics for NullPhysics {
    fn step(&mut self, _delta: Duration) {
        self.steps += 1;
    }

    fn reset(&mut self) {
        log::trace!("Null physics reset after {} steps", self.steps);
        self.steps = 0;
    }
}

/// Scripting runtime that runs nothing
#[derive(Debug, Default)]
pub struct NullScripting;

impl Scripting for NullScripting {
    fn invoke_start(&mut self, script: &str, owner_id: &str) {
        log::trace!("Skipping start of {} for {}", script, owner_id);
    }

    fn invoke_update(&mut self, _script: &str, _owner_id: &str, _delta: Duration) {}

    fn reset(&mut self) {}
}

/// Shared handles to every collaborator of the scene
#[derive(Clone)]
pub struct Subsystems {
    /// Render pass driver
    pub renderer: Arc<Mutex<Renderer>>,
    /// Resource cache
    pub resources: Arc<Mutex<ResourceManager>>,
    /// Physics runtime
    pub physics: Arc<Mutex<dyn Physics>>,
    /// Scripting runtime
    pub scripting: Arc<Mutex<dyn Scripting>>,
}

impl Subsystems {
    /// Bundle existing handles
    pub fn new(
        renderer: Arc<Mutex<Renderer>>,
        resources: Arc<Mutex<ResourceManager>>,
        physics: Arc<Mutex<dyn Physics>>,
        scripting: Arc<Mutex<dyn Scripting>>,
    ) -> Self {
        Self { renderer, resources, physics, scripting }
    }

    /// Subsystems around `device` with null physics and scripting
    pub fn with_device(config: &EngineConfig, device: Box<dyn RenderDevice>) -> RenderResult<Self> {
        let renderer = Renderer::new(config.renderer.clone(), device)?;
        let physics: Arc<Mutex<dyn Physics>> = Arc::new(Mutex::new(NullPhysics::default()));
        let scripting: Arc<Mutex<dyn Scripting>> = Arc::new(Mutex::new(NullScripting));
        Ok(Self::new(
            Arc::new(Mutex::new(renderer)),
            Arc::new(Mutex::new(ResourceManager::new(config.resources.clone()))),
            physics,
            scripting,
        ))
    }

    /// Subsystems backed by a [`RecordingDevice`], for tools and tests
    pub fn headless(config: &EngineConfig) -> RenderResult<Self> {
        Self::with_device(config, Box::new(RecordingDevice::new()))
    }
}
