//! Transform hierarchy
//!
//! Each [`GameObject`](super::GameObject) carries a [`Transform`] holding its
//! local position, rotation and scale plus links into the hierarchy. The
//! parent link is authoritative; the child list is a cache kept in step by
//! [`set_parent`] and rebuilt by [`resolve_children_recursively`].
//!
//! Links are arena keys, so the world-space queries in this module take the
//! arena they live in. World values are recomputed on every query.

use crate::foundation::math::{compose, translation_of, Mat4, Quat, Vec3};
use crate::io::{FileStream, StreamResult};

use super::{GameObjectKey, GameObjects};

/// Local TRS and hierarchy links of a game object
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    parent: Option<GameObjectKey>,
    children: Vec<GameObjectKey>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Transform {
    /// Create an identity transform without parent
    pub fn new() -> Self {
        Self::default()
    }

    /// Position relative to the parent
    pub fn position_local(&self) -> Vec3 {
        self.position
    }

    /// Set the position relative to the parent
    pub fn set_position_local(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Rotation relative to the parent
    pub fn rotation_local(&self) -> Quat {
        self.rotation
    }

    /// Set the rotation relative to the parent
    pub fn set_rotation_local(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Scale relative to the parent
    pub fn scale_local(&self) -> Vec3 {
        self.scale
    }

    /// Set the scale relative to the parent
    pub fn set_scale_local(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Local-to-parent matrix
    pub fn local_matrix(&self) -> Mat4 {
        compose(&self.position, &self.rotation, &self.scale)
    }

    /// Parent key, `None` for a root
    pub fn parent(&self) -> Option<GameObjectKey> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[GameObjectKey] {
        &self.children
    }

    /// Whether this transform has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_parent_key(&mut self, parent: Option<GameObjectKey>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: GameObjectKey) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: GameObjectKey) {
        self.children.retain(|&c| c != child);
    }

    /// Write local position, rotation and scale
    pub fn serialize(&self, stream: &mut FileStream) {
        stream.write_vec3(&self.position);
        stream.write_quat(&self.rotation);
        stream.write_vec3(&self.scale);
    }

    /// Read a transform written by [`Transform::serialize`]; links start empty
    pub fn deserialize(stream: &mut FileStream) -> StreamResult<Self> {
        Ok(Self {
            position: stream.read_vec3()?,
            rotation: stream.read_quat()?,
            scale: stream.read_vec3()?,
            ..Self::default()
        })
    }
}

/// Keys from `key` up to its root, `key` first
fn ancestry(objects: &GameObjects, key: GameObjectKey) -> Vec<GameObjectKey> {
    let mut chain = Vec::new();
    let mut current = Some(key);
    while let Some(k) = current {
        let Some(object) = objects.get(k) else { break };
        if chain.len() > objects.len() {
            log::error!("Transform hierarchy contains a cycle");
            break;
        }
        chain.push(k);
        current = object.transform().parent();
    }
    chain
}

/// Local-to-world matrix
pub fn world_matrix(objects: &GameObjects, key: GameObjectKey) -> Option<Mat4> {
    objects.get(key)?;
    Some(
        ancestry(objects, key)
            .into_iter()
            .rev()
            .fold(Mat4::identity(), |world, k| world * objects[k].transform().local_matrix()),
    )
}

/// World-space position
pub fn position(objects: &GameObjects, key: GameObjectKey) -> Option<Vec3> {
    world_matrix(objects, key).map(|m| translation_of(&m))
}

/// World-space rotation, ignoring any shear introduced by non-uniform scale
pub fn rotation(objects: &GameObjects, key: GameObjectKey) -> Option<Quat> {
    objects.get(key)?;
    Some(
        ancestry(objects, key)
            .into_iter()
            .rev()
            .fold(Quat::identity(), |world, k| world * objects[k].transform().rotation_local()),
    )
}

/// World-space scale as the product of local scales
pub fn scale(objects: &GameObjects, key: GameObjectKey) -> Option<Vec3> {
    objects.get(key)?;
    Some(
        ancestry(objects, key)
            .into_iter()
            .fold(Vec3::repeat(1.0), |world, k| world.component_mul(&objects[k].transform().scale_local())),
    )
}

/// World-space forward (-Z)
pub fn forward(objects: &GameObjects, key: GameObjectKey) -> Option<Vec3> {
    rotation(objects, key).map(|r| r * -Vec3::z())
}

/// World-space up (+Y)
pub fn up(objects: &GameObjects, key: GameObjectKey) -> Option<Vec3> {
    rotation(objects, key).map(|r| r * Vec3::y())
}

/// World-space right (+X)
pub fn right(objects: &GameObjects, key: GameObjectKey) -> Option<Vec3> {
    rotation(objects, key).map(|r| r * Vec3::x())
}

/// Whether `ancestor` is a strict ancestor of `key`
pub fn is_descendant_of(objects: &GameObjects, key: GameObjectKey, ancestor: GameObjectKey) -> bool {
    ancestry(objects, key).into_iter().skip(1).any(|k| k == ancestor)
}

/// Topmost ancestor, `key` itself for a root
pub fn root(objects: &GameObjects, key: GameObjectKey) -> Option<GameObjectKey> {
    ancestry(objects, key).last().copied()
}

/// Every descendant of `key` in pre-order, excluding `key`
pub fn descendants(objects: &GameObjects, key: GameObjectKey) -> Vec<GameObjectKey> {
    let mut out = Vec::new();
    let mut stack: Vec<GameObjectKey> = match objects.get(key) {
        Some(object) => object.transform().children().iter().rev().copied().collect(),
        None => return out,
    };

    while let Some(k) = stack.pop() {
        let Some(object) = objects.get(k) else { continue };
        if out.contains(&k) || k == key {
            continue;
        }
        out.push(k);
        stack.extend(object.transform().children().iter().rev().copied());
    }
    out
}

/// Move `child` under `parent`, or make it a root with `None`
///
/// The child keeps its local TRS. Returns `false` and changes nothing when
/// either key is unknown or the move would create a cycle.
pub fn set_parent(objects: &mut GameObjects, child: GameObjectKey, parent: Option<GameObjectKey>) -> bool {
    if !objects.contains_key(child) {
        log::debug!("set_parent on unknown game object");
        return false;
    }
    if let Some(p) = parent {
        if !objects.contains_key(p) {
            log::debug!("set_parent to unknown parent");
            return false;
        }
        if p == child || is_descendant_of(objects, p, child) {
            log::warn!("Refusing to parent {} under itself or its own descendant", objects[child].name());
            return false;
        }
    }

    let old = objects[child].transform().parent();
    if old == parent {
        return true;
    }
    if let Some(old_parent) = old.and_then(|k| objects.get_mut(k)) {
        old_parent.transform_mut().remove_child(child);
    }
    if let Some(new_parent) = parent.and_then(|k| objects.get_mut(k)) {
        new_parent.transform_mut().push_child(child);
    }
    objects[child].transform_mut().set_parent_key(parent);
    true
}

/// Rebuild the child caches of `key` and all its descendants from parent links
///
/// Cached children that are still linked keep their order; newly found
/// children are appended.
pub fn resolve_children_recursively(objects: &mut GameObjects, key: GameObjectKey) {
    let mut pending = vec![key];
    let mut visited = Vec::new();

    while let Some(current) = pending.pop() {
        if visited.contains(&current) || !objects.contains_key(current) {
            continue;
        }
        visited.push(current);

        let linked: Vec<GameObjectKey> = objects
            .iter()
            .filter(|(_, o)| o.transform().parent() == Some(current))
            .map(|(k, _)| k)
            .collect();

        let transform = objects[current].transform_mut();
        transform.children.retain(|c| linked.contains(c));
        for k in &linked {
            transform.push_child(*k);
        }
        pending.extend(transform.children.iter().copied());
    }
}

/// Rotate `key` so its world forward points at `target`
pub fn look_at(objects: &mut GameObjects, key: GameObjectKey, target: &Vec3) {
    let Some(eye) = position(objects, key) else { return };
    let Some(direction) = (target - eye).try_normalize(f32::EPSILON) else {
        log::debug!("look_at target coincides with the eye");
        return;
    };
    let up = if direction.cross(&Vec3::y()).norm() > 1e-4 { Vec3::y() } else { Vec3::z() };
    let desired = Quat::face_towards(&-direction, &up);

    let parent_rotation = objects[key]
        .transform()
        .parent()
        .and_then(|p| rotation(objects, p))
        .unwrap_or_else(Quat::identity);
    objects[key].transform_mut().set_rotation_local(parent_rotation.inverse() * desired);
}
