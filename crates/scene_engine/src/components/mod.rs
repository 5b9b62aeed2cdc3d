//! Components - capabilities attached to a game object
//!
//! A game object holds at most one component of each [`ComponentKind`] in a
//! [`ComponentSet`] ordered by kind, which also fixes the order components
//! are written to scene files. Typed access goes through [`ComponentType`],
//! dynamic access (lifecycle hooks, serialization) through [`Component`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::io::{FileStream, StreamResult};
use crate::resources::ResourceManager;
use crate::scene::GameObjectKey;
use crate::subsystems::Scripting;

/// Downcasting boilerplate shared by every component impl
macro_rules! component_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
            self
        }
    };
}

mod camera;
mod light;
mod line_renderer;
mod mesh_filter;
mod mesh_renderer;
mod script;
mod skybox;

pub use camera::{Camera, Projection};
pub use light::{Light, LightType};
pub use line_renderer::{LineRenderer, VertexPosCol};
pub use mesh_filter::{MeshFilter, MeshSource};
pub use mesh_renderer::MeshRenderer;
pub use script::Script;
pub use skybox::{Skybox, CUBE_FACES};

/// Tag identifying a component type in memory and in scene files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// [`Camera`]
    Camera,
    /// [`Light`]
    Light,
    /// [`MeshFilter`]
    MeshFilter,
    /// [`MeshRenderer`]
    MeshRenderer,
    /// [`LineRenderer`]
    LineRenderer,
    /// [`Script`]
    Script,
    /// [`Skybox`]
    Skybox,
}

impl ComponentKind {
    /// Every kind, in tag order
    pub const ALL: [Self; 7] = [
        Self::Camera,
        Self::Light,
        Self::MeshFilter,
        Self::MeshRenderer,
        Self::LineRenderer,
        Self::Script,
        Self::Skybox,
    ];

    /// Stable numeric tag written to scene files
    pub fn tag(self) -> u32 {
        match self {
            Self::Camera => 0,
            Self::Light => 1,
            Self::MeshFilter => 2,
            Self::MeshRenderer => 3,
            Self::LineRenderer => 4,
            Self::Script => 5,
            Self::Skybox => 6,
        }
    }

    /// Inverse of [`ComponentKind::tag`]
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Light => "Light",
            Self::MeshFilter => "MeshFilter",
            Self::MeshRenderer => "MeshRenderer",
            Self::LineRenderer => "LineRenderer",
            Self::Script => "Script",
            Self::Skybox => "Skybox",
        }
    }

    /// Default-constructed component of this kind
    pub fn instantiate(self) -> Box<dyn Component> {
        match self {
            Self::Camera => Box::<Camera>::default(),
            Self::Light => Box::<Light>::default(),
            Self::MeshFilter => Box::<MeshFilter>::default(),
            Self::MeshRenderer => Box::<MeshRenderer>::default(),
            Self::LineRenderer => Box::<LineRenderer>::default(),
            Self::Script => Box::<Script>::default(),
            Self::Skybox => Box::<Skybox>::default(),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a component can see of its surroundings during `start` and `update`
pub struct UpdateContext<'a> {
    /// Owning game object (non-owning back reference)
    pub owner: GameObjectKey,
    /// Owning game object's stable ID
    pub owner_id: &'a str,
    /// Frame time
    pub delta: Duration,
    /// Scripting runtime
    pub scripting: &'a mut dyn Scripting,
}

/// Behaviour attached to a game object
pub trait Component: Any + Send + Sync + fmt::Debug {
    /// Kind tag of this component
    fn kind(&self) -> ComponentKind;

    /// Called once when the scene starts
    fn start(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Called when the scene stops
    fn on_disable(&mut self) {}

    /// Called every tick for active game objects
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Write this component's payload
    fn serialize(&self, stream: &mut FileStream);

    /// Read a payload written by [`Component::serialize`]
    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()>;

    /// Resolve resource paths into loaded resources after deserialization
    fn bind_resources(&mut self, _resources: &mut ResourceManager) {}

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Owned upcast for downcasting
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Statically known component type, for the typed game object API
pub trait ComponentType: Component + Default {
    /// Kind tag of this type
    const KIND: ComponentKind;
}

/// At most one component per kind, iterated in tag order
pub type ComponentSet = BTreeMap<ComponentKind, Box<dyn Component>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_and_are_unique() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ComponentKind::from_tag(99), None);
    }

    #[test]
    fn test_instantiate_matches_kind() {
        for kind in ComponentKind::ALL {
            assert_eq!(kind.instantiate().kind(), kind);
        }
    }

    #[test]
    fn test_set_iterates_in_tag_order() {
        let mut set = ComponentSet::new();
        set.insert(ComponentKind::Skybox, ComponentKind::Skybox.instantiate());
        set.insert(ComponentKind::Camera, ComponentKind::Camera.instantiate());
        set.insert(ComponentKind::MeshFilter, ComponentKind::MeshFilter.instantiate());
        let order: Vec<_> = set.keys().copied().collect();
        assert_eq!(order, vec![ComponentKind::Camera, ComponentKind::MeshFilter, ComponentKind::Skybox]);
    }
}
