//! Scene file format
//!
//! ```text
//! magic "SCNE" | u32 version
//! u32 count, resource paths
//! u32 root count, root IDs
//! root game objects, each written recursively:
//!   ID | name | u32 flags | local TRS
//!   u32 component count, per component: u32 kind tag | u32 payload length | payload
//!   u32 child count, child IDs, children
//! ```
//!
//! Reading parses the whole file into a [`SceneSnapshot`] so a malformed
//! file is rejected before the live scene is touched.

use std::collections::HashSet;

use crate::components::{Component, ComponentKind};
use crate::io::{FileStream, MAX_SEQUENCE_LENGTH};

use super::{GameObjectFlags, GameObjectKey, GameObjects, SceneError, SceneResult, Transform};

/// Leading bytes of every scene file
pub const SCENE_FILE_MAGIC: [u8; 4] = *b"SCNE";

/// Format version written by this build
pub const SCENE_FILE_VERSION: u32 = 1;

/// Deepest hierarchy accepted when reading
const MAX_HIERARCHY_DEPTH: usize = 256;

/// One game object and its subtree, parsed but not yet in a scene
#[derive(Debug)]
pub struct GameObjectRecord {
    /// Stable ID
    pub id: String,
    /// Display name
    pub name: String,
    /// State bits
    pub flags: GameObjectFlags,
    /// Local TRS, without links
    pub transform: Transform,
    /// Deserialized components in file order
    pub components: Vec<Box<dyn Component>>,
    /// Child subtrees
    pub children: Vec<GameObjectRecord>,
}

impl GameObjectRecord {
    /// Records in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Fully parsed scene file
#[derive(Debug, Default)]
pub struct SceneSnapshot {
    /// Resources the scene referenced when saved
    pub resource_paths: Vec<String>,
    /// Root subtrees in saved order
    pub roots: Vec<GameObjectRecord>,
}

impl SceneSnapshot {
    /// Number of game objects in the snapshot
    pub fn object_count(&self) -> usize {
        self.roots.iter().map(GameObjectRecord::count).sum()
    }

    /// Parse a complete scene file; trailing bytes are an error
    pub fn read(stream: &mut FileStream) -> SceneResult<Self> {
        let magic = stream.read_bytes(SCENE_FILE_MAGIC.len())?;
        if magic != SCENE_FILE_MAGIC.as_slice() {
            return Err(SceneError::Format("missing scene file signature".to_string()));
        }
        let version = stream.read_u32()?;
        if version != SCENE_FILE_VERSION {
            return Err(SceneError::UnsupportedVersion { found: version, expected: SCENE_FILE_VERSION });
        }

        let resource_paths = stream.read_strings()?;
        let root_ids = read_ids(stream)?;

        let mut seen = HashSet::new();
        let roots = root_ids
            .iter()
            .map(|id| read_game_object(stream, id, &mut seen, 0))
            .collect::<SceneResult<Vec<_>>>()?;

        if !stream.is_exhausted() {
            return Err(SceneError::Format(format!("{} trailing bytes", stream.remaining())));
        }
        Ok(Self { resource_paths, roots })
    }
}

fn read_ids(stream: &mut FileStream) -> SceneResult<Vec<String>> {
    let count = stream.read_count(MAX_SEQUENCE_LENGTH)?;
    (0..count).map(|_| stream.read_str().map_err(SceneError::from)).collect()
}

fn read_game_object(
    stream: &mut FileStream,
    expected_id: &str,
    seen: &mut HashSet<String>,
    depth: usize,
) -> SceneResult<GameObjectRecord> {
    if depth > MAX_HIERARCHY_DEPTH {
        return Err(SceneError::Format(format!("hierarchy deeper than {MAX_HIERARCHY_DEPTH}")));
    }

    let id = stream.read_str()?;
    if id != expected_id {
        return Err(SceneError::Format(format!("expected game object {expected_id}, found {id}")));
    }
    if !seen.insert(id.clone()) {
        return Err(SceneError::Format(format!("duplicate game object {id}")));
    }

    let name = stream.read_str()?;
    let flags = GameObjectFlags::from_bits_truncate(stream.read_u32()?);
    let transform = Transform::deserialize(stream)?;

    let component_count = stream.read_count(u32::try_from(ComponentKind::ALL.len()).unwrap_or(u32::MAX))?;
    let mut components: Vec<Box<dyn Component>> = Vec::with_capacity(component_count);
    for _ in 0..component_count {
        let component = read_component(stream)?;
        if components.iter().any(|c| c.kind() == component.kind()) {
            return Err(SceneError::Format(format!("{id} has two {} components", component.kind())));
        }
        components.push(component);
    }

    let child_ids = read_ids(stream)?;
    let children = child_ids
        .iter()
        .map(|child| read_game_object(stream, child, seen, depth + 1))
        .collect::<SceneResult<Vec<_>>>()?;

    Ok(GameObjectRecord { id, name, flags, transform, components, children })
}

fn read_component(stream: &mut FileStream) -> SceneResult<Box<dyn Component>> {
    let tag = stream.read_u32()?;
    let kind = ComponentKind::from_tag(tag)
        .ok_or_else(|| SceneError::Format(format!("unknown component tag {tag}")))?;

    let length = stream.read_count(u32::MAX)?;
    let mut payload = FileStream::from_bytes(stream.read_bytes(length)?.to_vec());

    let mut component = kind.instantiate();
    component.deserialize(&mut payload)?;
    if !payload.is_exhausted() {
        return Err(SceneError::Format(format!("{kind} payload has {} unread bytes", payload.remaining())));
    }
    Ok(component)
}

/// Serialize `roots` and their subtrees, with `resource_paths` up front
pub fn write_scene(stream: &mut FileStream, objects: &GameObjects, resource_paths: &[String], roots: &[GameObjectKey]) {
    stream.write_bytes(&SCENE_FILE_MAGIC);
    stream.write_u32(SCENE_FILE_VERSION);
    stream.write_strings(resource_paths);
    write_ids(stream, objects, roots);
    for &root in roots {
        write_game_object(stream, objects, root);
    }
}

fn write_ids(stream: &mut FileStream, objects: &GameObjects, keys: &[GameObjectKey]) {
    let ids: Vec<String> = keys.iter().filter_map(|&k| objects.get(k)).map(|o| o.id().to_string()).collect();
    stream.write_strings(&ids);
}

fn write_game_object(stream: &mut FileStream, objects: &GameObjects, key: GameObjectKey) {
    let Some(object) = objects.get(key) else { return };

    stream.write_str(object.id());
    stream.write_str(object.name());
    stream.write_u32(object.flags().bits());
    object.transform().serialize(stream);

    stream.write_u32(u32::try_from(object.component_count()).unwrap_or(u32::MAX));
    for component in object.components() {
        let mut payload = FileStream::new();
        component.serialize(&mut payload);
        stream.write_u32(component.kind().tag());
        stream.write_u32(u32::try_from(payload.as_bytes().len()).unwrap_or(u32::MAX));
        stream.write_bytes(payload.as_bytes());
    }

    let children = object.transform().children();
    write_ids(stream, objects, children);
    for &child in children {
        write_game_object(stream, objects, child);
    }
}
