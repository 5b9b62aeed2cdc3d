//! Game objects - addressable entities made of a transform and components

use bitflags::bitflags;
use std::time::Duration;
use uuid::Uuid;

use crate::components::{Component, ComponentKind, ComponentSet, ComponentType, UpdateContext};
use crate::subsystems::Scripting;

use super::Transform;

slotmap::new_key_type! {
    /// Arena key of a game object inside its scene
    pub struct GameObjectKey;
}

bitflags! {
    /// Game object state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GameObjectFlags: u32 {
        /// Receives `update` every tick
        const ACTIVE = 1 << 0;
        /// Listed in hierarchy views
        const HIERARCHY_VISIBLE = 1 << 1;
    }
}

impl Default for GameObjectFlags {
    fn default() -> Self {
        Self::ACTIVE | Self::HIERARCHY_VISIBLE
    }
}

/// An entity in the scene
#[derive(Debug)]
pub struct GameObject {
    id: String,
    name: String,
    flags: GameObjectFlags,
    transform: Transform,
    components: ComponentSet,
}

impl Default for GameObject {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObject {
    /// Create an empty game object with a fresh ID
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub(crate) fn with_id(id: String) -> Self {
        Self {
            id,
            name: "GameObject".to_string(),
            flags: GameObjectFlags::default(),
            transform: Transform::default(),
            components: ComponentSet::new(),
        }
    }

    /// Stable ID, unique within a scene and preserved across save / load
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// State bits
    pub fn flags(&self) -> GameObjectFlags {
        self.flags
    }

    pub(crate) fn set_flags(&mut self, flags: GameObjectFlags) {
        self.flags = flags;
    }

    /// Whether `update` reaches this object's components
    pub fn is_active(&self) -> bool {
        self.flags.contains(GameObjectFlags::ACTIVE)
    }

    /// Enable or disable per-tick updates
    pub fn set_active(&mut self, active: bool) {
        self.flags.set(GameObjectFlags::ACTIVE, active);
    }

    /// Whether hierarchy views list this object
    pub fn is_hierarchy_visible(&self) -> bool {
        self.flags.contains(GameObjectFlags::HIERARCHY_VISIBLE)
    }

    /// Show or hide this object in hierarchy views
    pub fn set_hierarchy_visibility(&mut self, visible: bool) {
        self.flags.set(GameObjectFlags::HIERARCHY_VISIBLE, visible);
    }

    /// Local transform and hierarchy links
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable local transform; hierarchy links only change through
    /// [`super::transform::set_parent`]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Attach a default `T` and return it
    ///
    /// When a `T` is already attached it is kept and returned unchanged. A
    /// component of another type registered under `T`'s kind is replaced.
    pub fn add_component<T: ComponentType>(&mut self) -> Option<&mut T> {
        if self.has_component::<T>() {
            log::warn!("{} already has a {} component", self.name, T::KIND);
        } else {
            self.components.insert(T::KIND, Box::<T>::default());
        }
        self.get_component_mut::<T>()
    }

    /// Attach a component built elsewhere, replacing any of the same kind
    pub fn insert_component(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        self.components.insert(component.kind(), component)
    }

    /// Attached `T`, if any
    pub fn get_component<T: ComponentType>(&self) -> Option<&T> {
        self.components.get(&T::KIND)?.as_any().downcast_ref::<T>()
    }

    /// Mutable attached `T`, if any
    pub fn get_component_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.components.get_mut(&T::KIND)?.as_any_mut().downcast_mut::<T>()
    }

    /// Whether a `T` is attached
    pub fn has_component<T: ComponentType>(&self) -> bool {
        self.components
            .get(&T::KIND)
            .is_some_and(|c| c.as_any().is::<T>())
    }

    /// Whether a component of `kind` is attached
    pub fn has_component_kind(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Detach and return the attached `T`
    ///
    /// Dropping the returned component releases whatever GPU resources it
    /// owns.
    pub fn remove_component<T: ComponentType>(&mut self) -> Option<Box<T>> {
        let component = self.components.remove(&T::KIND)?;
        component.into_any().downcast::<T>().ok()
    }

    /// Attached components in kind order
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.values().map(|c| c.as_ref())
    }

    /// Mutable attached components in kind order
    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> {
        self.components.values_mut()
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Forward `start` to every component
    pub fn start(&mut self, key: GameObjectKey, scripting: &mut dyn Scripting) {
        let mut ctx = UpdateContext {
            owner: key,
            owner_id: &self.id,
            delta: Duration::ZERO,
            scripting,
        };
        for component in self.components.values_mut() {
            component.start(&mut ctx);
        }
    }

    /// Forward `on_disable` to every component
    pub fn on_disable(&mut self) {
        for component in self.components.values_mut() {
            component.on_disable();
        }
    }

    /// Forward `update` to every component
    pub fn update(&mut self, key: GameObjectKey, delta: Duration, scripting: &mut dyn Scripting) {
        let mut ctx = UpdateContext {
            owner: key,
            owner_id: &self.id,
            delta,
            scripting,
        };
        for component in self.components.values_mut() {
            component.update(&mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Camera, Light, LightType, MeshFilter, Script};
    use crate::subsystems::NullScripting;

    #[test]
    fn test_new_objects_have_unique_ids_and_default_flags() {
        let a = GameObject::new();
        let b = GameObject::new();
        assert_ne!(a.id(), b.id());
        assert!(a.is_active());
        assert!(a.is_hierarchy_visible());
    }

    #[test]
    fn test_add_get_remove_component() {
        let mut object = GameObject::new();
        object.add_component::<Light>().unwrap().set_intensity(3.0);

        assert!(object.has_component::<Light>());
        assert!(!object.has_component::<Camera>());
        assert_eq!(object.get_component::<Light>().unwrap().intensity(), 3.0);

        object.get_component_mut::<Light>().unwrap().set_light_type(LightType::Directional);
        let removed = object.remove_component::<Light>().unwrap();
        assert_eq!(removed.light_type(), LightType::Directional);
        assert!(object.remove_component::<Light>().is_none());
        assert_eq!(object.component_count(), 0);
    }

    #[test]
    fn test_adding_twice_keeps_the_first_instance() {
        let mut object = GameObject::new();
        object.add_component::<Light>().unwrap().set_range(42.0);
        let again = object.add_component::<Light>().unwrap();
        assert_eq!(again.range(), 42.0);
        assert_eq!(object.component_count(), 1);
    }

    /// Claims the light slot without being a [`Light`]
    #[derive(Debug)]
    struct Impostor;

    impl Component for Impostor {
        fn kind(&self) -> ComponentKind {
            ComponentKind::Light
        }

        fn serialize(&self, _stream: &mut crate::io::FileStream) {}

        fn deserialize(&mut self, _stream: &mut crate::io::FileStream) -> crate::io::StreamResult<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
            self
        }
    }

    #[test]
    fn test_add_replaces_foreign_component_in_slot() {
        let mut object = GameObject::new();
        object.insert_component(Box::new(Impostor));
        assert!(object.has_component_kind(ComponentKind::Light));
        assert!(!object.has_component::<Light>());

        let light = object.add_component::<Light>().unwrap();
        assert_eq!(light.light_type(), LightType::Point);
        assert!(object.has_component::<Light>());
        assert_eq!(object.component_count(), 1);
    }

    #[test]
    fn test_components_iterate_in_kind_order() {
        let mut object = GameObject::new();
        object.add_component::<Script>();
        object.add_component::<Camera>();
        object.add_component::<MeshFilter>();

        let kinds: Vec<_> = object.components().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![ComponentKind::Camera, ComponentKind::MeshFilter, ComponentKind::Script]);
    }

    #[test]
    fn test_flags_toggle_independently() {
        let mut object = GameObject::new();
        object.set_active(false);
        assert!(!object.is_active());
        assert!(object.is_hierarchy_visible());
        object.set_hierarchy_visibility(false);
        assert_eq!(object.flags(), GameObjectFlags::empty());
    }

    #[test]
    fn test_lifecycle_reaches_components() {
        let mut object = GameObject::new();
        object.add_component::<Script>().unwrap().add_script("scripts/spin.script");
        let mut scripting = NullScripting;
        object.start(GameObjectKey::default(), &mut scripting);
        object.update(GameObjectKey::default(), Duration::from_millis(16), &mut scripting);
        object.on_disable();
        assert_eq!(object.get_component::<Script>().unwrap().scripts().len(), 1);
    }
}
