//! The scene - owner of every game object and of the derived render sets

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::components::{Camera, Light, LightType, LineRenderer, MeshFilter, MeshRenderer, Script, Skybox};
use crate::core::config::SceneConfig;
use crate::foundation::math::{utils, Mat4, Vec2, Vec3};
use crate::foundation::time::FpsCounter;
use crate::io::FileStream;
use crate::resources::{kind_of_file, Material, Mesh, ResourceKind, ResourceManager, ScriptAsset, Texture};
use crate::subsystems::Subsystems;

use super::picking::{pick_nearest, BoundingSphere};
use super::serialization::{write_scene, GameObjectRecord, SceneSnapshot};
use super::{transform, GameObject, GameObjectKey, GameObjects, SceneError, SceneResult};

/// Every live game object plus the sets the renderer draws from
///
/// Structural changes (create, remove, load, clear) re-run [`Scene::resolve`]
/// before returning. Attaching or detaching components does not; call
/// [`Scene::resolve`] afterwards.
pub struct Scene {
    config: SceneConfig,
    subsystems: Subsystems,

    objects: GameObjects,
    order: Vec<GameObjectKey>,
    index: HashMap<String, GameObjectKey>,

    main_camera: Option<GameObjectKey>,
    skybox: Option<GameObjectKey>,
    renderables: Vec<GameObjectKey>,
    directional_lights: Vec<GameObjectKey>,
    point_lights: Vec<GameObjectKey>,

    ambient_light: Vec3,
    viewport: Vec2,
    fps: FpsCounter,
    started: bool,
}

impl Scene {
    /// Create an empty scene around its collaborators
    pub fn new(config: SceneConfig, subsystems: Subsystems) -> Self {
        let fps = FpsCounter::new(Duration::from_millis(config.fps_report_interval_ms));
        #[allow(clippy::cast_precision_loss)]
        let viewport = Vec2::new(config.viewport_width as f32, config.viewport_height as f32);
        Self {
            config,
            subsystems,
            objects: GameObjects::with_key(),
            order: Vec::new(),
            index: HashMap::new(),
            main_camera: None,
            skybox: None,
            renderables: Vec::new(),
            directional_lights: Vec::new(),
            point_lights: Vec::new(),
            ambient_light: Vec3::repeat(0.2),
            viewport,
            fps,
            started: false,
        }
    }

    /// Populate the default camera, skybox and sun when configured to
    pub fn initialize(&mut self) {
        if self.config.create_default_objects {
            self.create_default_camera();
            self.create_default_skybox();
            self.create_default_directional_light();
        }
        self.resolve();
        log::info!("Scene initialized with {} game objects", self.objects.len());
    }

    fn create_default_camera(&mut self) {
        let script = self
            .subsystems
            .resources
            .lock()
            .resource_directory(ResourceKind::Script)
            .join("MouseLook.script");

        let key = self.create_game_object();
        let object = &mut self.objects[key];
        object.set_name("Camera");
        object.transform_mut().set_position_local(Vec3::new(0.0, 1.0, -5.0));
        object.add_component::<Camera>();
        if let Some(scripts) = object.add_component::<Script>() {
            scripts.add_script(script.to_string_lossy());
        }
        transform::look_at(&mut self.objects, key, &Vec3::zeros());
    }

    fn create_default_skybox(&mut self) {
        let key = self.create_game_object();
        let object = &mut self.objects[key];
        object.set_name("Skybox");
        object.add_component::<LineRenderer>();
        object.add_component::<Skybox>();
        object.set_hierarchy_visibility(false);
    }

    fn create_default_directional_light(&mut self) {
        let key = self.create_game_object();
        let object = &mut self.objects[key];
        object.set_name("DirectionalLight");
        object
            .transform_mut()
            .set_rotation_local(utils::quat_from_euler_degrees(30.0, 0.0, 0.0));
        if let Some(light) = object.add_component::<Light>() {
            light.set_light_type(LightType::Directional);
            light.set_intensity(4.0);
        }
    }

    /// Run every component's start hook
    pub fn start(&mut self) {
        let mut scripting = self.subsystems.scripting.lock();
        for &key in &self.order {
            if let Some(object) = self.objects.get_mut(key) {
                object.start(key, &mut *scripting);
            }
        }
        self.started = true;
    }

    /// Run every component's disable hook
    pub fn on_disable(&mut self) {
        for object in self.objects.values_mut() {
            object.on_disable();
        }
        self.started = false;
    }

    /// Whether [`Scene::start`] ran since the last [`Scene::on_disable`]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Scene settings
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Collaborators this scene was built with
    pub fn subsystems(&self) -> &Subsystems {
        &self.subsystems
    }

    // Game objects

    /// Add an empty root game object
    pub fn create_game_object(&mut self) -> GameObjectKey {
        let object = GameObject::new();
        let id = object.id().to_string();
        let key = self.objects.insert(object);
        self.order.push(key);
        self.index.insert(id, key);
        self.resolve();
        key
    }

    /// Remove a game object together with all its descendants
    ///
    /// Returns `false` when `key` is unknown.
    pub fn remove_game_object(&mut self, key: GameObjectKey) -> bool {
        let Some(object) = self.objects.get(key) else {
            log::debug!("Ignoring removal of unknown game object");
            return false;
        };
        let parent = object.transform().parent();

        let mut doomed = transform::descendants(&self.objects, key);
        doomed.push(key);
        self.detach_from_parent(key, parent);
        self.drop_objects(&doomed);

        if let Some(parent) = parent {
            transform::resolve_children_recursively(&mut self.objects, parent);
        }
        self.resolve();
        true
    }

    /// Remove exactly one game object; its children become roots
    ///
    /// Returns `false` when `key` is unknown.
    pub fn remove_single_game_object(&mut self, key: GameObjectKey) -> bool {
        let Some(object) = self.objects.get(key) else {
            log::debug!("Ignoring removal of unknown game object");
            return false;
        };
        let parent = object.transform().parent();
        let children = object.transform().children().to_vec();

        for child in children {
            if let Some(child) = self.objects.get_mut(child) {
                child.transform_mut().set_parent_key(None);
            }
        }
        self.detach_from_parent(key, parent);
        self.drop_objects(&[key]);
        self.resolve();
        true
    }

    /// Remove a game object and its descendants by ID
    pub fn remove_game_object_by_id(&mut self, id: &str) -> bool {
        match self.game_object_by_id(id) {
            Some(key) => self.remove_game_object(key),
            None => false,
        }
    }

    fn detach_from_parent(&mut self, key: GameObjectKey, parent: Option<GameObjectKey>) {
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent.transform_mut().remove_child(key);
        }
    }

    fn drop_objects(&mut self, keys: &[GameObjectKey]) {
        let doomed: HashSet<GameObjectKey> = keys.iter().copied().collect();
        for &key in keys {
            if let Some(object) = self.objects.remove(key) {
                self.index.remove(object.id());
                log::debug!("Removed game object {} ({})", object.name(), object.id());
            }
        }
        self.order.retain(|k| !doomed.contains(k));
    }

    /// Game object behind `key`
    pub fn game_object(&self, key: GameObjectKey) -> Option<&GameObject> {
        self.objects.get(key)
    }

    /// Mutable game object behind `key`
    pub fn game_object_mut(&mut self, key: GameObjectKey) -> Option<&mut GameObject> {
        self.objects.get_mut(key)
    }

    /// Key of the game object with `id`
    pub fn game_object_by_id(&self, id: &str) -> Option<GameObjectKey> {
        self.index.get(id).copied()
    }

    /// Key of the first game object, in creation order, named `name`
    pub fn game_object_by_name(&self, name: &str) -> Option<GameObjectKey> {
        self.order.iter().copied().find(|&k| self.objects[k].name() == name)
    }

    /// Whether a game object with `id` exists
    pub fn game_object_exists(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Parentless game objects in creation order
    pub fn root_game_objects(&self) -> Vec<GameObjectKey> {
        self.order
            .iter()
            .copied()
            .filter(|&k| self.objects[k].transform().is_root())
            .collect()
    }

    /// Topmost ancestor of `key`
    pub fn game_object_root(&self, key: GameObjectKey) -> Option<GameObjectKey> {
        transform::root(&self.objects, key)
    }

    /// Every key in creation order
    pub fn game_object_keys(&self) -> &[GameObjectKey] {
        &self.order
    }

    /// The arena itself, for hierarchy queries in [`transform`]
    pub fn game_objects(&self) -> &GameObjects {
        &self.objects
    }

    /// Number of game objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene holds no game objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Reparent `child`; see [`transform::set_parent`]
    pub fn set_parent(&mut self, child: GameObjectKey, parent: Option<GameObjectKey>) -> bool {
        transform::set_parent(&mut self.objects, child, parent)
    }

    /// Local-to-world matrix of `key`
    pub fn world_matrix(&self, key: GameObjectKey) -> Option<Mat4> {
        transform::world_matrix(&self.objects, key)
    }

    /// World-space position of `key`
    pub fn world_position(&self, key: GameObjectKey) -> Option<Vec3> {
        transform::position(&self.objects, key)
    }

    // Derived sets

    /// Rebuild camera, skybox, renderable and light sets
    pub fn resolve(&mut self) {
        self.main_camera = None;
        self.skybox = None;
        self.renderables.clear();
        self.directional_lights.clear();
        self.point_lights.clear();

        for &key in &self.order {
            let object = &self.objects[key];
            if object.has_component::<Camera>() {
                self.main_camera = Some(key);
            }
            if object.has_component::<Skybox>() {
                self.skybox = Some(key);
            }
            if object.has_component::<MeshFilter>() && object.has_component::<MeshRenderer>() {
                self.renderables.push(key);
            }
            if let Some(light) = object.get_component::<Light>() {
                match light.light_type() {
                    LightType::Directional => self.directional_lights.push(key),
                    LightType::Point | LightType::Spot => self.point_lights.push(key),
                }
            }
        }
    }

    /// Last resolved game object with a camera
    pub fn main_camera(&self) -> Option<GameObjectKey> {
        self.main_camera
    }

    /// Last resolved game object with a skybox
    pub fn skybox(&self) -> Option<GameObjectKey> {
        self.skybox
    }

    /// Game objects with both a mesh filter and a mesh renderer
    pub fn renderables(&self) -> &[GameObjectKey] {
        &self.renderables
    }

    /// Game objects with a directional light
    pub fn directional_lights(&self) -> &[GameObjectKey] {
        &self.directional_lights
    }

    /// Game objects with a point or spot light
    pub fn point_lights(&self) -> &[GameObjectKey] {
        &self.point_lights
    }

    /// Ambient light colour
    pub fn ambient_light(&self) -> Vec3 {
        self.ambient_light
    }

    /// Set the ambient light colour
    pub fn set_ambient_light(&mut self, color: Vec3) {
        self.ambient_light = color;
    }

    // Frame

    /// Advance physics and every active game object by `delta`
    pub fn update(&mut self, delta: Duration) {
        self.subsystems.physics.lock().step(delta);

        {
            let mut scripting = self.subsystems.scripting.lock();
            for &key in &self.order {
                if let Some(object) = self.objects.get_mut(key).filter(|o| o.is_active()) {
                    object.update(key, delta, &mut *scripting);
                }
            }
        }

        self.calculate_fps(delta);
    }

    /// Count one frame of `delta` toward the frame rate
    pub fn calculate_fps(&mut self, delta: Duration) {
        if let Some(fps) = self.fps.tick(delta) {
            log::trace!("Scene running at {:.1} fps", fps);
        }
    }

    /// Frame rate of the last complete reporting window
    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    /// Screen size used for picking
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Set the screen size used for picking
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    /// Nearest renderable under `screen_point`
    ///
    /// `screen_point` is in pixels from the top-left of the viewport. Each
    /// renderable is approximated by a sphere around its world position whose
    /// radius is the largest world-scaled extent of its mesh bounds.
    pub fn mouse_pick(&self, screen_point: Vec2) -> Option<GameObjectKey> {
        let camera_key = self.main_camera?;
        let camera = self.objects.get(camera_key)?.get_component::<Camera>()?;
        let camera_world = self.world_matrix(camera_key)?;
        let ray = camera.screen_to_ray(&camera_world, &screen_point, &self.viewport)?;
        let viewer = self.world_position(camera_key)?;

        let candidates = self
            .renderables
            .iter()
            .copied()
            .filter(|&k| Some(k) != self.skybox)
            .filter_map(|k| {
                let bounds = self.objects.get(k)?.get_component::<MeshFilter>()?.bounding_box();
                let center = transform::position(&self.objects, k)?;
                let scale = transform::scale(&self.objects, k)?;
                let radius = bounds.extents().component_mul(&scale).abs().max();
                Some((k, BoundingSphere::new(center, radius)))
            });

        pick_nearest(&ray, &viewer, candidates)
    }

    // Lifetime

    /// Drop every game object and reset all collaborators
    ///
    /// Locks the renderer; do not call while holding it.
    pub fn clear(&mut self) {
        let count = self.objects.len();
        self.objects.clear();
        self.order.clear();
        self.index.clear();
        self.resolve();

        self.subsystems.resources.lock().unload();
        self.subsystems.scripting.lock().reset();
        self.subsystems.physics.lock().reset();
        self.subsystems.renderer.lock().clear();
        log::debug!("Scene cleared ({} game objects dropped)", count);
    }

    fn scene_file_path(&self, path: &Path) -> PathBuf {
        let extension = self.config.file_extension.as_str();
        if path.extension().is_some_and(|e| e == extension) {
            return path.to_path_buf();
        }
        let mut with_extension = path.as_os_str().to_owned();
        with_extension.push(".");
        with_extension.push(extension);
        PathBuf::from(with_extension)
    }

    /// Write every game object to `path`
    ///
    /// The scene extension is appended when missing.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> SceneResult<()> {
        let path = self.scene_file_path(path.as_ref());

        let resource_paths = {
            let resources = self.subsystems.resources.lock();
            if let Err(e) = resources.save_resource_metadata() {
                log::warn!("Resource metadata not written: {}", e);
            }
            resources.resource_file_paths()
        };

        let roots = self.root_game_objects();
        let mut stream = FileStream::new();
        write_scene(&mut stream, &self.objects, &resource_paths, &roots);

        stream.save(&path).map_err(|e| {
            log::error!("Failed to save scene to {}: {}", path.display(), e);
            SceneError::from(e)
        })?;
        log::info!("Saved {} game objects to {}", self.objects.len(), path.display());
        Ok(())
    }

    /// Replace the scene with the contents of `path`
    ///
    /// The file is parsed completely first; a missing or malformed file
    /// leaves the scene untouched. Resources that fail to load are skipped.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> SceneResult<()> {
        let path = self.scene_file_path(path.as_ref());
        if !path.exists() {
            log::error!("Scene file {} does not exist", path.display());
            return Err(SceneError::NotFound(path));
        }

        let snapshot = FileStream::open(&path)
            .map_err(SceneError::from)
            .and_then(|mut stream| SceneSnapshot::read(&mut stream))
            .map_err(|e| {
                log::error!("Failed to load scene from {}: {}", path.display(), e);
                e
            })?;

        self.clear();

        {
            let mut resources = self.subsystems.resources.lock();
            for resource in &snapshot.resource_paths {
                preload_resource(&mut resources, resource);
            }
        }

        for record in snapshot.roots {
            self.instantiate(record, None);
        }

        {
            let mut resources = self.subsystems.resources.lock();
            for object in self.objects.values_mut() {
                for component in object.components_mut() {
                    component.bind_resources(&mut resources);
                }
            }
        }

        self.resolve();
        log::info!("Loaded {} game objects from {}", self.objects.len(), path.display());
        Ok(())
    }

    fn instantiate(&mut self, record: GameObjectRecord, parent: Option<GameObjectKey>) -> GameObjectKey {
        let GameObjectRecord { id, name, flags, transform, components, children } = record;

        let mut object = GameObject::with_id(id.clone());
        object.set_name(name);
        object.set_flags(flags);
        object.set_transform(transform);
        object.transform_mut().set_parent_key(parent);
        for component in components {
            object.insert_component(component);
        }

        let key = self.objects.insert(object);
        self.order.push(key);
        self.index.insert(id, key);
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent.transform_mut().push_child(key);
        }

        for child in children {
            self.instantiate(child, Some(key));
        }
        key
    }
}

fn preload_resource(resources: &mut ResourceManager, path: &str) {
    let loaded = match kind_of_file(path) {
        Some(ResourceKind::Mesh) => resources.load::<Mesh>(path).map(drop),
        Some(ResourceKind::Material) => resources.load::<Material>(path).map(drop),
        Some(ResourceKind::Texture) => resources.load::<Texture>(path).map(drop),
        Some(ResourceKind::Script) => resources.load::<ScriptAsset>(path).map(drop),
        None => {
            log::warn!("Skipping resource {} of unknown type", path);
            return;
        }
    };
    if let Err(e) = loaded {
        log::warn!("Skipping resource {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::resources::Primitive;
    use approx::assert_relative_eq;

    fn empty_scene() -> Scene {
        let config = EngineConfig::default();
        let subsystems = Subsystems::headless(&config).unwrap();
        Scene::new(config.scene.with_default_objects(false), subsystems)
    }

    fn add_renderable(scene: &mut Scene, position: Vec3) -> GameObjectKey {
        let key = scene.create_game_object();
        let object = scene.game_object_mut(key).unwrap();
        object.transform_mut().set_position_local(position);
        object.add_component::<MeshFilter>().unwrap().set_primitive(Primitive::Cube);
        object.add_component::<MeshRenderer>();
        key
    }

    #[test]
    fn test_initialize_creates_defaults() {
        let config = EngineConfig::default();
        let mut scene = Scene::new(config.scene.clone(), Subsystems::headless(&config).unwrap());
        scene.initialize();

        assert_eq!(scene.len(), 3);
        let camera = scene.main_camera().unwrap();
        assert_eq!(scene.game_object(camera).unwrap().name(), "Camera");
        let script = scene.game_object(camera).unwrap().get_component::<Script>().unwrap();
        assert!(script.scripts()[0].ends_with("MouseLook.script"));

        let skybox = scene.skybox().unwrap();
        assert!(!scene.game_object(skybox).unwrap().is_hierarchy_visible());
        assert!(scene.game_object(skybox).unwrap().has_component::<LineRenderer>());

        let sun = scene.directional_lights()[0];
        assert_eq!(scene.game_object(sun).unwrap().get_component::<Light>().unwrap().intensity(), 4.0);
        assert!(scene.renderables().is_empty());
    }

    #[test]
    fn test_resolve_buckets_lights_and_renderables() {
        let mut scene = empty_scene();
        let mesh = add_renderable(&mut scene, Vec3::zeros());
        let filter_only = scene.create_game_object();
        scene.game_object_mut(filter_only).unwrap().add_component::<MeshFilter>();
        let spot = scene.create_game_object();
        scene.game_object_mut(spot).unwrap().add_component::<Light>().unwrap().set_light_type(LightType::Spot);
        scene.resolve();

        assert_eq!(scene.renderables(), &[mesh]);
        assert_eq!(scene.point_lights(), &[spot]);
        assert!(scene.directional_lights().is_empty());

        let before = (scene.renderables().to_vec(), scene.point_lights().to_vec());
        scene.resolve();
        assert_eq!(before, (scene.renderables().to_vec(), scene.point_lights().to_vec()));
    }

    #[test]
    fn test_last_camera_wins() {
        let mut scene = empty_scene();
        let first = scene.create_game_object();
        let second = scene.create_game_object();
        scene.game_object_mut(first).unwrap().add_component::<Camera>();
        scene.game_object_mut(second).unwrap().add_component::<Camera>();
        scene.resolve();
        assert_eq!(scene.main_camera(), Some(second));
    }

    #[test]
    fn test_by_id_and_name_lookups() {
        let mut scene = empty_scene();
        let key = scene.create_game_object();
        scene.game_object_mut(key).unwrap().set_name("Crate");
        let id = scene.game_object(key).unwrap().id().to_string();

        assert!(scene.game_object_exists(&id));
        assert_eq!(scene.game_object_by_id(&id), Some(key));
        assert_eq!(scene.game_object_by_name("Crate"), Some(key));
        assert!(scene.remove_game_object_by_id(&id));
        assert!(!scene.game_object_exists(&id));
        assert!(!scene.remove_game_object_by_id(&id));
    }

    #[test]
    fn test_inactive_objects_skip_update_but_fps_counts() {
        let mut scene = empty_scene();
        let key = scene.create_game_object();
        scene.game_object_mut(key).unwrap().set_active(false);
        for _ in 0..60 {
            scene.update(Duration::from_micros(16_667));
        }
        assert_relative_eq!(scene.fps(), 60.0, epsilon = 0.01);
    }

    #[test]
    fn test_scene_extension_is_appended_once() {
        let scene = empty_scene();
        assert_eq!(scene.scene_file_path(Path::new("level")), PathBuf::from("level.scene"));
        assert_eq!(scene.scene_file_path(Path::new("level.scene")), PathBuf::from("level.scene"));
        assert_eq!(scene.scene_file_path(Path::new("level.v2")), PathBuf::from("level.v2.scene"));
    }

    #[test]
    fn test_save_leaves_scene_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = empty_scene();
        add_renderable(&mut scene, Vec3::new(1.0, 2.0, 3.0));
        scene.resolve();

        let frozen: &Scene = &scene;
        frozen.save_to_file(dir.path().join("frozen")).unwrap();
        assert!(dir.path().join("frozen.scene").exists());
        assert_eq!(frozen.len(), 1);
        assert_eq!(frozen.renderables().len(), 1);
    }

    #[test]
    fn test_pick_uses_world_scaled_bounds() {
        let mut scene = empty_scene();
        let camera = scene.create_game_object();
        scene.game_object_mut(camera).unwrap().add_component::<Camera>();
        scene
            .game_object_mut(camera)
            .unwrap()
            .transform_mut()
            .set_position_local(Vec3::new(0.0, 0.0, 10.0));

        // Off-centre by 1.2 units: missed at unit scale, hit when scaled up
        let target = add_renderable(&mut scene, Vec3::new(1.2, 0.0, 0.0));
        scene.resolve();
        scene.set_viewport(800.0, 600.0);
        let centre = Vec2::new(400.0, 300.0);
        assert_eq!(scene.mouse_pick(centre), None);

        scene
            .game_object_mut(target)
            .unwrap()
            .transform_mut()
            .set_scale_local(Vec3::repeat(4.0));
        assert_eq!(scene.mouse_pick(centre), Some(target));
    }
}
