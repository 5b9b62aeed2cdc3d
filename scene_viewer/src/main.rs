//! Headless scene viewer
//!
//! Builds a small scene on a recording device, runs it for a few seconds of
//! simulated frames, then saves it, reloads it in the background and renders
//! the reloaded scene once more.
//!
//! Usage: `scene_viewer [config.toml|config.ron] [output-scene]`

use parking_lot::Mutex;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use scene_engine::render::{DeviceCall, RenderResult};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
enum ViewerError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

const FRAME_TIME: Duration = Duration::from_micros(16_667);

fn build_scene(scene: &mut Scene) {
    let floor = scene.create_game_object();
    if let Some(object) = scene.game_object_mut(floor) {
        object.set_name("Floor");
        object.transform_mut().set_scale_local(Vec3::new(10.0, 1.0, 10.0));
        if let Some(filter) = object.add_component::<MeshFilter>() {
            filter.set_primitive(Primitive::Quad);
        }
        object.add_component::<MeshRenderer>();
    }

    let crate_key = scene.create_game_object();
    if let Some(object) = scene.game_object_mut(crate_key) {
        object.set_name("Crate");
        object.transform_mut().set_position_local(Vec3::new(0.0, 0.5, 0.0));
        if let Some(filter) = object.add_component::<MeshFilter>() {
            filter.set_primitive(Primitive::Cube);
        }
        object.add_component::<MeshRenderer>();
        let bounds = object.get_component::<MeshFilter>().map(MeshFilter::bounding_box).unwrap_or_default();
        if let Some(lines) = object.add_component::<LineRenderer>() {
            lines.add_bounding_box(&bounds, Vec4::new(0.0, 1.0, 0.0, 1.0));
        }
    }

    let lamp = scene.create_game_object();
    if let Some(object) = scene.game_object_mut(lamp) {
        object.set_name("Lamp");
        object.transform_mut().set_position_local(Vec3::new(0.0, 2.0, 0.0));
        if let Some(light) = object.add_component::<Light>() {
            light.set_light_type(LightType::Point);
        }
    }
    scene.set_parent(lamp, Some(crate_key));
    scene.resolve();
}

fn render_frame(scene: &mut Scene) -> RenderResult<()> {
    let renderer = Arc::clone(&scene.subsystems().renderer);
    let mut renderer = renderer.lock();
    renderer.render(scene)
}

fn run(config: EngineConfig, output: &str) -> Result<(), ViewerError> {
    let device = RecordingDevice::new();
    let device_log = device.log();
    let subsystems = Subsystems::with_device(&config, Box::new(device))?;

    let mut scene = Scene::new(config.scene.clone(), subsystems);
    scene.initialize();
    build_scene(&mut scene);
    scene.start();

    let mut timer = Timer::new();
    for _ in 0..120 {
        scene.update(FRAME_TIME);
        render_frame(&mut scene)?;
        timer.update();
    }
    log::info!(
        "Simulated {} frames at {:.1} fps in {:.3}s wall time, {} draws recorded",
        timer.frame_count(),
        scene.fps(),
        timer.total_time(),
        device_log.count(|c| matches!(c, DeviceCall::DrawIndexed { .. } | DeviceCall::Draw { .. }))
    );

    let (width, height) = (config.scene.viewport_width as f32, config.scene.viewport_height as f32);
    match scene.mouse_pick(Vec2::new(width * 0.5, height * 0.5)) {
        Some(key) => log::info!("Centre of the screen hits {}", scene.game_object(key).map_or("?", GameObject::name)),
        None => log::info!("Centre of the screen hits nothing"),
    }

    scene.save_to_file(output)?;
    scene.on_disable();

    let shared: SharedScene = Arc::new(Mutex::new(scene));
    let queue = TaskQueue::new()?;
    let stopwatch = Stopwatch::start_new();
    Scene::load_from_file_async(&shared, &queue, output).wait()?;

    let mut scene = shared.lock();
    log::info!("Reloaded {} game objects in {:.2}ms", scene.len(), stopwatch.elapsed_millis());
    render_frame(&mut scene)?;
    Ok(())
}

fn main() {
    let mut args = std::env::args().skip(1);
    let config = args
        .next()
        .map_or_else(EngineConfig::default, EngineConfig::load_or_default);
    let output = args.next().unwrap_or_else(|| "viewer".to_string());

    logging::init_with_level(&config.log_level);
    log::info!("Starting scene viewer...");

    if let Err(e) = run(config, &output) {
        log::error!("Scene viewer failed: {}", e);
        std::process::exit(1);
    }
    log::info!("Scene viewer finished");
}
