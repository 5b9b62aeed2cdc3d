//! Resource Manager - path-keyed cache of CPU-side resources
//!
//! Resources are loaded once per path and handed out as `Arc<T>`; the scene
//! records [`ResourceManager::resource_file_paths`] when it is saved so the
//! same set can be reloaded before its game objects are rebuilt.
//!
//! **Ownership**: the manager is shared with the scene through
//! `Arc<Mutex<ResourceManager>>` in [`crate::subsystems::Subsystems`].

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Resource, ResourceError, ResourceKind, ResourceResult};
use crate::core::config::ResourceConfig;

/// Sidecar description written next to every cached resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Resource category
    pub kind: ResourceKind,
    /// Path the resource was requested with
    pub path: String,
    /// File size at the time of writing
    pub size_bytes: u64,
}

struct CachedResource {
    kind: ResourceKind,
    resource: Arc<dyn Any + Send + Sync>,
}

/// Path-keyed resource cache
pub struct ResourceManager {
    config: ResourceConfig,
    cache: BTreeMap<String, CachedResource>,
}

impl ResourceManager {
    /// Create an empty manager rooted at `config.root_dir`
    pub fn new(config: ResourceConfig) -> Self {
        log::debug!("Creating ResourceManager rooted at {}", config.root_dir.display());
        Self { config, cache: BTreeMap::new() }
    }

    /// Load `path` as a `T`, or return the cached instance
    pub fn load<T: Resource>(&mut self, path: &str) -> ResourceResult<Arc<T>> {
        if let Some(cached) = self.cache.get(path) {
            return Self::downcast(path, cached);
        }

        let resolved = self.resolve_path(path);
        let resource = Arc::new(T::load_from_file(&resolved)?);
        log::info!("Loaded {:?} resource {}", T::KIND, path);
        self.cache.insert(
            path.to_string(),
            CachedResource { kind: T::KIND, resource: resource.clone() },
        );
        Ok(resource)
    }

    /// Register a resource created in memory under `path`
    pub fn insert<T: Resource>(&mut self, path: &str, resource: T) -> Arc<T> {
        let resource = Arc::new(resource);
        self.cache.insert(
            path.to_string(),
            CachedResource { kind: T::KIND, resource: resource.clone() },
        );
        resource
    }

    /// Cached resource at `path`, if it was loaded as a `T`
    pub fn get<T: Resource>(&self, path: &str) -> Option<Arc<T>> {
        self.cache.get(path).and_then(|cached| Self::downcast(path, cached).ok())
    }

    /// Whether anything is cached under `path`
    pub fn is_loaded(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }

    /// Number of cached resources
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached resource; components keep their own `Arc`s alive
    pub fn unload(&mut self) {
        log::debug!("Unloading {} cached resources", self.cache.len());
        self.cache.clear();
    }

    /// Paths of every cached resource, in sorted order
    pub fn resource_file_paths(&self) -> Vec<String> {
        self.cache.keys().cloned().collect()
    }

    /// Directory that holds resources of `kind`
    pub fn resource_directory(&self, kind: ResourceKind) -> PathBuf {
        let sub = match kind {
            ResourceKind::Mesh => &self.config.meshes_dir,
            ResourceKind::Material => &self.config.materials_dir,
            ResourceKind::Texture => &self.config.textures_dir,
            ResourceKind::Script => &self.config.scripts_dir,
        };
        self.config.root_dir.join(sub)
    }

    /// Write a `.meta` RON file next to every cached resource that exists on
    /// disk; returns how many were written
    pub fn save_resource_metadata(&self) -> ResourceResult<usize> {
        let mut written = 0;
        for (path, cached) in &self.cache {
            let resolved = self.resolve_path(path);
            let Ok(file_meta) = std::fs::metadata(&resolved) else {
                continue;
            };

            let metadata = ResourceMetadata {
                kind: cached.kind,
                path: path.clone(),
                size_bytes: file_meta.len(),
            };
            let text = ron::ser::to_string_pretty(&metadata, ron::ser::PrettyConfig::default())
                .map_err(|e| ResourceError::Metadata(e.to_string()))?;

            let mut meta_path = resolved.into_os_string();
            meta_path.push(".meta");
            std::fs::write(&meta_path, text)?;
            written += 1;
        }
        log::debug!("Saved metadata for {} resources", written);
        Ok(written)
    }

    /// Paths are used as given when they exist, otherwise relative to the root
    fn resolve_path(&self, path: &str) -> PathBuf {
        let direct = Path::new(path);
        if direct.is_absolute() || direct.exists() {
            direct.to_path_buf()
        } else {
            self.config.root_dir.join(direct)
        }
    }

    fn downcast<T: Resource>(path: &str, cached: &CachedResource) -> ResourceResult<Arc<T>> {
        Arc::clone(&cached.resource)
            .downcast::<T>()
            .map_err(|_| ResourceError::TypeMismatch {
                path: path.to_string(),
                cached: cached.kind,
                requested: T::KIND,
            })
    }
}
