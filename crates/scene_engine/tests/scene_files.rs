//! Saving and loading whole scenes

use approx::assert_relative_eq;
use parking_lot::Mutex;
use scene_engine::components::MeshSource;
use scene_engine::prelude::*;
use std::sync::Arc;

fn new_scene() -> Scene {
    let config = EngineConfig::default();
    let subsystems = Subsystems::headless(&config).unwrap();
    Scene::new(config.scene.with_default_objects(false), subsystems)
}

/// Camera, a crate with a child lamp, and a loose sun
fn populate(scene: &mut Scene) {
    let camera = scene.create_game_object();
    let object = scene.game_object_mut(camera).unwrap();
    object.set_name("Camera");
    object.transform_mut().set_position_local(Vec3::new(0.0, 2.0, 8.0));
    object.add_component::<Camera>().unwrap().set_fov_degrees(60.0);

    let crate_key = scene.create_game_object();
    let object = scene.game_object_mut(crate_key).unwrap();
    object.set_name("Crate");
    object.transform_mut().set_position_local(Vec3::new(1.0, 0.5, -2.0));
    object.transform_mut().set_scale_local(Vec3::new(2.0, 1.0, 2.0));
    object.add_component::<MeshFilter>().unwrap().set_primitive(Primitive::Cube);
    object.add_component::<MeshRenderer>();
    object.add_component::<Script>().unwrap().add_script("scripts/Spin.script");

    let lamp = scene.create_game_object();
    let object = scene.game_object_mut(lamp).unwrap();
    object.set_name("Lamp");
    object.set_active(false);
    object.transform_mut().set_position_local(Vec3::new(0.0, 3.0, 0.0));
    let light = object.add_component::<Light>().unwrap();
    light.set_range(25.0);
    light.set_intensity(7.5);
    scene.set_parent(lamp, Some(crate_key));

    let sun = scene.create_game_object();
    let object = scene.game_object_mut(sun).unwrap();
    object.set_name("Sun");
    object.add_component::<Light>().unwrap().set_light_type(LightType::Directional);

    scene.resolve();
}

fn id_of(scene: &Scene, name: &str) -> String {
    let key = scene.game_object_by_name(name).unwrap();
    scene.game_object(key).unwrap().id().to_string()
}

#[test]
fn test_save_clear_load_restores_scene() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level");

    let mut scene = new_scene();
    populate(&mut scene);
    let ids: Vec<String> = ["Camera", "Crate", "Lamp", "Sun"].iter().map(|n| id_of(&scene, n)).collect();
    let lamp_world = scene.world_position(scene.game_object_by_name("Lamp").unwrap()).unwrap();

    scene.save_to_file(&path).unwrap();
    assert!(dir.path().join("level.scene").exists());

    scene.clear();
    assert!(scene.is_empty());

    scene.load_from_file(&path).unwrap();
    assert_eq!(scene.len(), 4);
    for (name, id) in ["Camera", "Crate", "Lamp", "Sun"].iter().zip(&ids) {
        assert_eq!(scene.game_object_by_id(id), scene.game_object_by_name(name), "{}", name);
    }

    let crate_key = scene.game_object_by_id(&ids[1]).unwrap();
    let lamp_key = scene.game_object_by_id(&ids[2]).unwrap();
    let crate_object = scene.game_object(crate_key).unwrap();
    assert_eq!(crate_object.transform().children(), &[lamp_key]);
    assert_relative_eq!(crate_object.transform().scale_local(), Vec3::new(2.0, 1.0, 2.0));
    assert_eq!(
        crate_object.get_component::<MeshFilter>().unwrap().source(),
        &MeshSource::Primitive(Primitive::Cube)
    );
    assert_eq!(crate_object.get_component::<Script>().unwrap().scripts(), &["scripts/Spin.script".to_string()]);

    let lamp = scene.game_object(lamp_key).unwrap();
    assert!(!lamp.is_active());
    assert_eq!(lamp.transform().parent(), Some(crate_key));
    let light = lamp.get_component::<Light>().unwrap();
    assert_relative_eq!(light.range(), 25.0);
    assert_relative_eq!(light.intensity(), 7.5);
    assert_relative_eq!(scene.world_position(lamp_key).unwrap(), lamp_world, epsilon = 1e-5);

    let camera = scene.game_object_by_id(&ids[0]).unwrap();
    assert_eq!(scene.main_camera(), Some(camera));
    assert_relative_eq!(scene.game_object(camera).unwrap().get_component::<Camera>().unwrap().fov_degrees(), 60.0);
    assert_eq!(scene.renderables(), &[crate_key]);
    assert_eq!(scene.point_lights(), &[lamp_key]);
    assert_eq!(scene.directional_lights().len(), 1);
    assert_eq!(scene.root_game_objects().len(), 3);
}

#[test]
fn test_missing_file_leaves_scene_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = new_scene();
    populate(&mut scene);

    let result = scene.load_from_file(dir.path().join("nowhere"));
    assert!(matches!(result, Err(SceneError::NotFound(path)) if path.ends_with("nowhere.scene")));
    assert_eq!(scene.len(), 4);
    assert!(scene.main_camera().is_some());
}

#[test]
fn test_corrupt_file_leaves_scene_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.scene");

    let mut scene = new_scene();
    populate(&mut scene);
    scene.save_to_file(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() / 2);
    std::fs::write(&path, &bytes).unwrap();

    let mut other = new_scene();
    let lone = other.create_game_object();
    assert!(matches!(other.load_from_file(&path), Err(SceneError::Format(_))));
    assert_eq!(other.len(), 1);
    assert!(other.game_object(lone).is_some());
}

#[test]
fn test_newer_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.scene");

    let mut scene = new_scene();
    populate(&mut scene);
    scene.save_to_file(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let result = scene.load_from_file(&path);
    assert!(matches!(result, Err(SceneError::UnsupportedVersion { found: 99, .. })));
    assert_eq!(scene.len(), 4);
}

#[test]
fn test_degenerate_camera_planes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camera.scene");

    let mut scene = new_scene();
    let camera = scene.create_game_object();
    scene.game_object_mut(camera).unwrap().add_component::<Camera>().unwrap().set_clip_planes(0.25, 1234.5);
    scene.resolve();
    scene.save_to_file(&path).unwrap();

    // Collapse the far plane onto the near plane
    let mut bytes = std::fs::read(&path).unwrap();
    let far = 1234.5f32.to_le_bytes();
    let offset = bytes.windows(4).position(|w| w == far).unwrap();
    bytes[offset..offset + 4].copy_from_slice(&0.25f32.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let mut other = new_scene();
    other.set_viewport(800.0, 600.0);
    assert!(matches!(other.load_from_file(&path), Err(SceneError::Format(_))));
    assert!(other.is_empty());
    assert_eq!(other.mouse_pick(Vec2::new(400.0, 300.0)), None);
}

#[test]
fn test_background_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("async");

    let mut scene = new_scene();
    populate(&mut scene);
    let crate_id = id_of(&scene, "Crate");

    let shared: SharedScene = Arc::new(Mutex::new(scene));
    let queue = TaskQueue::new().unwrap();

    Scene::save_to_file_async(&shared, &queue, &path).wait().unwrap();
    shared.lock().clear();
    assert!(shared.lock().is_empty());

    Scene::load_from_file_async(&shared, &queue, &path).wait().unwrap();
    let scene = shared.lock();
    assert_eq!(scene.len(), 4);
    assert!(scene.game_object_exists(&crate_id));
    assert_eq!(scene.renderables().len(), 1);
}

#[test]
fn test_background_load_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let shared: SharedScene = Arc::new(Mutex::new(new_scene()));
    let queue = TaskQueue::new().unwrap();

    let mut task = Scene::load_from_file_async(&shared, &queue, dir.path().join("absent"));
    while !task.is_finished() {
        std::thread::yield_now();
    }
    assert!(matches!(task.try_result(), Some(Err(SceneError::NotFound(_)))));
}
