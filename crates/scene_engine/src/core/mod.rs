//! # Core Engine Module
//!
//! Shared configuration types that every subsystem of the core reads.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for the scene, renderer and resources

pub mod config;

pub use config::{
    EngineConfig,
    SceneConfig,
    RendererConfig,
    ResourceConfig,
};
