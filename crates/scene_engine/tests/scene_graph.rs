//! Scene graph structure: resolve, removal and hierarchy queries

use approx::assert_relative_eq;
use scene_engine::prelude::*;
use std::time::Duration;

fn new_scene() -> Scene {
    let config = EngineConfig::default();
    let subsystems = Subsystems::headless(&config).unwrap();
    Scene::new(config.scene.with_default_objects(false), subsystems)
}

fn child_of(scene: &mut Scene, parent: GameObjectKey) -> GameObjectKey {
    let key = scene.create_game_object();
    assert!(scene.set_parent(key, Some(parent)));
    key
}

#[test]
fn test_resolve_is_idempotent_and_complete() {
    let mut scene = new_scene();
    let camera = scene.create_game_object();
    let sun = scene.create_game_object();
    let bulb = scene.create_game_object();
    let spot = scene.create_game_object();
    let mesh = scene.create_game_object();

    scene.game_object_mut(camera).unwrap().add_component::<Camera>();
    scene.game_object_mut(sun).unwrap().add_component::<Light>().unwrap().set_light_type(LightType::Directional);
    scene.game_object_mut(bulb).unwrap().add_component::<Light>();
    scene.game_object_mut(spot).unwrap().add_component::<Light>().unwrap().set_light_type(LightType::Spot);
    let object = scene.game_object_mut(mesh).unwrap();
    object.add_component::<MeshFilter>().unwrap().set_primitive(Primitive::Sphere);
    object.add_component::<MeshRenderer>();
    scene.resolve();

    let snapshot = |scene: &Scene| {
        (
            scene.main_camera(),
            scene.skybox(),
            scene.renderables().to_vec(),
            scene.directional_lights().to_vec(),
            scene.point_lights().to_vec(),
        )
    };
    let first = snapshot(&scene);
    assert_eq!(first, (Some(camera), None, vec![mesh], vec![sun], vec![bulb, spot]));

    scene.resolve();
    assert_eq!(snapshot(&scene), first);
}

#[test]
fn test_removing_component_then_resolving_drops_renderable() {
    let mut scene = new_scene();
    let key = scene.create_game_object();
    let object = scene.game_object_mut(key).unwrap();
    object.add_component::<MeshFilter>().unwrap().set_primitive(Primitive::Cube);
    object.add_component::<MeshRenderer>();
    scene.resolve();
    assert_eq!(scene.renderables(), &[key]);

    scene.game_object_mut(key).unwrap().remove_component::<MeshRenderer>();
    scene.resolve();
    assert!(scene.renderables().is_empty());
}

#[test]
fn test_cascading_removal_takes_whole_subtree() {
    let mut scene = new_scene();
    let root = scene.create_game_object();
    let parent = child_of(&mut scene, root);
    let child = child_of(&mut scene, parent);
    let grandchild = child_of(&mut scene, child);
    let sibling = child_of(&mut scene, root);

    assert!(scene.remove_game_object(parent));

    for gone in [parent, child, grandchild] {
        assert!(scene.game_object(gone).is_none());
    }
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.game_object(root).unwrap().transform().children(), &[sibling]);
    assert_eq!(scene.game_object_keys(), &[root, sibling]);
}

#[test]
fn test_single_removal_orphans_children_as_roots() {
    let mut scene = new_scene();
    let root = scene.create_game_object();
    let middle = child_of(&mut scene, root);
    let leaf_a = child_of(&mut scene, middle);
    let leaf_b = child_of(&mut scene, middle);

    assert!(scene.remove_single_game_object(middle));

    assert!(scene.game_object(middle).is_none());
    assert!(scene.game_object(root).unwrap().transform().children().is_empty());
    for leaf in [leaf_a, leaf_b] {
        assert!(scene.game_object(leaf).unwrap().transform().is_root());
        assert_eq!(scene.game_object_root(leaf), Some(leaf));
    }
    assert_eq!(scene.root_game_objects(), vec![root, leaf_a, leaf_b]);
}

#[test]
fn test_removing_unknown_key_changes_nothing() {
    let mut scene = new_scene();
    let key = scene.create_game_object();
    assert!(scene.remove_game_object(key));
    assert!(!scene.remove_game_object(key));
    assert!(!scene.remove_single_game_object(key));
    assert!(scene.is_empty());
}

#[test]
fn test_world_transform_follows_reparenting() {
    let mut scene = new_scene();
    let a = scene.create_game_object();
    let b = scene.create_game_object();
    let child = scene.create_game_object();
    scene.game_object_mut(a).unwrap().transform_mut().set_position_local(Vec3::new(1.0, 0.0, 0.0));
    scene.game_object_mut(b).unwrap().transform_mut().set_position_local(Vec3::new(0.0, 0.0, 3.0));
    scene.game_object_mut(child).unwrap().transform_mut().set_position_local(Vec3::new(0.0, 1.0, 0.0));

    scene.set_parent(child, Some(a));
    assert_relative_eq!(scene.world_position(child).unwrap(), Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);

    scene.set_parent(child, Some(b));
    assert_relative_eq!(scene.world_position(child).unwrap(), Vec3::new(0.0, 1.0, 3.0), epsilon = 1e-6);
    assert!(scene.game_object(a).unwrap().transform().children().is_empty());

    assert!(!scene.set_parent(b, Some(child)));
    assert_eq!(scene.game_object_root(child), Some(b));
}

#[test]
fn test_fps_over_one_second_of_frames() {
    let mut scene = new_scene();
    assert_eq!(scene.fps(), 0.0);

    for _ in 0..59 {
        scene.calculate_fps(Duration::from_micros(16_667));
    }
    assert_eq!(scene.fps(), 0.0);

    scene.calculate_fps(Duration::from_micros(16_667));
    assert_relative_eq!(scene.fps(), 60.0, epsilon = 0.01);

    // Counters restart after each report
    for _ in 0..30 {
        scene.calculate_fps(Duration::from_micros(33_334));
    }
    assert_relative_eq!(scene.fps(), 30.0, epsilon = 0.01);
}

#[test]
fn test_fps_with_frames_that_split_the_second_exactly() {
    let mut scene = new_scene();
    let frame = Duration::from_secs(1) / 60;
    for _ in 0..60 {
        scene.calculate_fps(frame);
    }
    assert_relative_eq!(scene.fps(), 60.0, epsilon = 0.01);

    for _ in 0..59 {
        scene.calculate_fps(frame);
    }
    // Still the last complete window
    assert_relative_eq!(scene.fps(), 60.0, epsilon = 0.01);
}

#[test]
fn test_clear_resets_everything() {
    let config = EngineConfig::default();
    let mut scene = Scene::new(config.scene.clone(), Subsystems::headless(&config).unwrap());
    scene.initialize();
    assert!(scene.main_camera().is_some());

    scene.clear();
    assert!(scene.is_empty());
    assert!(scene.main_camera().is_none());
    assert!(scene.skybox().is_none());
    assert!(scene.directional_lights().is_empty());
    assert!(scene.subsystems().resources.lock().is_empty());
}
