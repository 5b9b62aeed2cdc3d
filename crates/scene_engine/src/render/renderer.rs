//! Render pass driver
//!
//! Walks a resolved [`Scene`] once per frame and records a depth pre-pass,
//! a lighting pass and a present into the frame target. Mesh, line and
//! skybox resources are uploaded lazily and stored in the components that
//! own them.

use crate::components::{Camera, Light, LineRenderer, MeshFilter, MeshRenderer, Skybox};
use crate::core::config::RendererConfig;
use crate::foundation::math::{translation_of, Mat4, Vec3};
use crate::resources::Mesh;
use crate::scene::{transform, GameObjectKey, Scene};

use super::constants::{
    ConstantBuffer, FrameConstants, GpuDirectionalLight, GpuPointLight, LightConstants, ObjectConstants,
};
use super::device::{BufferId, BufferUsage, PassKind, RenderDevice, TextureId, Topology};
use super::gpu::{GpuBuffer, GpuMesh, GpuRelease, GpuTexture, ReleaseQueue};
use super::{RenderError, RenderResult};

/// Constant buffer slot of [`FrameConstants`]
pub const FRAME_CONSTANTS_SLOT: u32 = 0;
/// Constant buffer slot of [`ObjectConstants`]
pub const OBJECT_CONSTANTS_SLOT: u32 = 1;
/// Constant buffer slot of [`LightConstants`]
pub const LIGHT_CONSTANTS_SLOT: u32 = 2;
/// Texture slot of the skybox cube
pub const SKYBOX_TEXTURE_SLOT: u32 = 0;

const LINE_COLOR: [f32; 4] = [1.0; 4];

/// Counters of the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames rendered before this one
    pub frame: u64,
    /// Meshes drawn in the depth pre-pass
    pub depth_draws: u32,
    /// Meshes drawn in the lighting pass
    pub lit_draws: u32,
    /// Line lists drawn
    pub line_draws: u32,
    /// Whether a skybox was drawn
    pub skybox_drawn: bool,
    /// Device resources released before the frame
    pub released: u32,
}

/// Drives a [`RenderDevice`] from scene state
pub struct Renderer {
    config: RendererConfig,
    device: Box<dyn RenderDevice>,
    queue: ReleaseQueue,
    releases: flume::Receiver<GpuRelease>,

    target: Option<GpuTexture>,
    resolution: (u32, u32),

    frame_constants: ConstantBuffer<FrameConstants>,
    object_constants: ConstantBuffer<ObjectConstants>,
    light_constants: ConstantBuffer<LightConstants>,
    skybox_mesh: Option<GpuMesh>,

    frame_index: u64,
    stats: FrameStats,
}

impl Renderer {
    /// Create a renderer and its initial frame target
    pub fn new(config: RendererConfig, device: Box<dyn RenderDevice>) -> RenderResult<Self> {
        let (queue, releases) = ReleaseQueue::new();
        let (width, height) = (config.initial_width, config.initial_height);
        let mut renderer = Self {
            config,
            device,
            queue,
            releases,
            target: None,
            resolution: (0, 0),
            frame_constants: ConstantBuffer::new(),
            object_constants: ConstantBuffer::new(),
            light_constants: ConstantBuffer::new(),
            skybox_mesh: None,
            frame_index: 0,
            stats: FrameStats::default(),
        };
        renderer.set_resolution(width, height)?;
        log::info!("Renderer created on {} device at {}x{}", renderer.device.name(), width, height);
        Ok(renderer)
    }

    /// Name of the underlying device
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Sampleable view of the last presented frame
    pub fn frame_shader_resource(&self) -> Option<TextureId> {
        self.target.as_ref().map(GpuTexture::id)
    }

    /// Largest accepted frame dimension
    pub fn max_resolution(&self) -> u32 {
        self.config.max_resolution
    }

    /// Current frame size
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Counters of the last rendered frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Recreate the frame target at `width` x `height`
    ///
    /// Zero or oversized dimensions are rejected and keep the current target.
    pub fn set_resolution(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let max = self.config.max_resolution;
        if width == 0 || height == 0 || width > max || height > max {
            log::warn!("Rejecting frame size {}x{} (maximum {})", width, height, max);
            return Err(RenderError::InvalidResolution { width, height, max });
        }
        if self.target.is_some() && self.resolution == (width, height) {
            return Ok(());
        }

        let id = self.device.create_render_target(width, height)?;
        self.target = Some(GpuTexture::new(id, width, height, self.queue.clone()));
        self.resolution = (width, height);
        self.process_releases();
        log::debug!("Frame target resized to {}x{}", width, height);
        Ok(())
    }

    /// Drop renderer-owned frame resources
    ///
    /// The frame target survives so the host keeps a valid view.
    pub fn clear(&mut self) {
        self.skybox_mesh = None;
        self.frame_constants.release();
        self.object_constants.release();
        self.light_constants.release();
        let released = self.process_releases();
        self.stats = FrameStats::default();
        log::debug!("Renderer cleared, {} device resources released", released);
    }

    fn process_releases(&mut self) -> u32 {
        let mut released = 0;
        for release in self.releases.try_iter() {
            match release {
                GpuRelease::Buffer(id) => self.device.release_buffer(id),
                GpuRelease::Texture(id) => self.device.release_texture(id),
            }
            released += 1;
        }
        released
    }

    fn create_buffer(&mut self, usage: BufferUsage, bytes: &[u8]) -> RenderResult<GpuBuffer> {
        let id = self.device.create_buffer(usage, bytes)?;
        Ok(GpuBuffer::new(id, usage, bytes.len(), self.queue.clone()))
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> RenderResult<GpuMesh> {
        let vertices = self.create_buffer(BufferUsage::Vertex, bytemuck::cast_slice(mesh.vertices()))?;
        let indices = self.create_buffer(BufferUsage::Index, bytemuck::cast_slice(mesh.indices()))?;
        Ok(GpuMesh { vertices, indices, index_count: mesh.index_count() })
    }

    /// Render one frame of `scene`
    ///
    /// Without a camera the frame target is only cleared.
    pub fn render(&mut self, scene: &mut Scene) -> RenderResult<()> {
        self.stats = FrameStats { frame: self.frame_index, ..FrameStats::default() };
        self.stats.released = self.process_releases();
        self.frame_index += 1;

        let target = self
            .frame_shader_resource()
            .ok_or_else(|| RenderError::RenderingFailed("no frame target".to_string()))?;

        let Some(camera_key) = scene.main_camera() else {
            return self.device.clear_target(target, self.config.clear_color);
        };
        let Some((camera, camera_world)) = scene
            .game_object(camera_key)
            .and_then(|o| o.get_component::<Camera>().cloned())
            .zip(scene.world_matrix(camera_key))
        else {
            return self.device.clear_target(target, self.config.clear_color);
        };

        let (width, height) = self.resolution;
        #[allow(clippy::cast_precision_loss)]
        let aspect = width as f32 / height as f32;
        let view = camera.view_matrix(&camera_world);
        let projection = camera.projection_matrix(aspect);
        let view_projection = projection * view;
        let eye = translation_of(&camera_world);

        self.frame_constants
            .set(FrameConstants::new(&view, &projection, &eye, width, height));
        let frame_buffer = self.frame_constants.upload(self.device.as_mut(), &self.queue)?;

        // Depth pre-pass
        self.device.begin_pass(PassKind::Depth, target, None)?;
        let result = self.depth_pass(scene, &view_projection, frame_buffer);
        self.device.end_pass()?;
        result?;

        // Lighting pass
        let clear: [f32; 4] = camera.clear_color().into();
        self.device.begin_pass(PassKind::Lighting, target, Some(clear))?;
        let result = self.lighting_pass(scene, &view_projection, &eye, frame_buffer);
        self.device.end_pass()?;
        result?;

        self.device.present(target)?;
        log::trace!("Frame {} rendered: {:?}", self.stats.frame, self.stats);
        Ok(())
    }

    fn depth_pass(&mut self, scene: &mut Scene, view_projection: &Mat4, frame_buffer: BufferId) -> RenderResult<()> {
        self.device.bind_constant_buffer(FRAME_CONSTANTS_SLOT, frame_buffer)?;
        for key in scene.renderables().to_vec() {
            if self.draw_mesh(scene, key, view_projection)? {
                self.stats.depth_draws += 1;
            }
        }
        Ok(())
    }

    fn lighting_pass(
        &mut self,
        scene: &mut Scene,
        view_projection: &Mat4,
        eye: &Vec3,
        frame_buffer: BufferId,
    ) -> RenderResult<()> {
        self.device.bind_constant_buffer(FRAME_CONSTANTS_SLOT, frame_buffer)?;

        self.light_constants.set(gather_lights(scene));
        let light_buffer = self.light_constants.upload(self.device.as_mut(), &self.queue)?;
        self.device.bind_constant_buffer(LIGHT_CONSTANTS_SLOT, light_buffer)?;

        for key in scene.renderables().to_vec() {
            if self.draw_mesh(scene, key, view_projection)? {
                self.stats.lit_draws += 1;
            }
        }

        for key in scene.game_object_keys().to_vec() {
            if self.draw_lines(scene, key, view_projection)? {
                self.stats.line_draws += 1;
            }
        }

        if let Some(key) = scene.skybox() {
            self.stats.skybox_drawn = self.draw_skybox(scene, key, view_projection, eye)?;
        }
        Ok(())
    }

    fn bind_object(&mut self, world: &Mat4, view_projection: &Mat4, color: [f32; 4]) -> RenderResult<()> {
        self.object_constants.set(ObjectConstants::new(world, view_projection, color));
        let id = self.object_constants.upload(self.device.as_mut(), &self.queue)?;
        self.device.bind_constant_buffer(OBJECT_CONSTANTS_SLOT, id)
    }

    fn draw_mesh(&mut self, scene: &mut Scene, key: GameObjectKey, view_projection: &Mat4) -> RenderResult<bool> {
        let Some(world) = scene.world_matrix(key) else { return Ok(false) };
        let Some(object) = scene.game_object_mut(key) else { return Ok(false) };
        let color = object
            .get_component::<MeshRenderer>()
            .map_or([1.0; 4], |renderer| renderer.material().base_color);
        let Some(filter) = object.get_component_mut::<MeshFilter>() else { return Ok(false) };

        if filter.gpu_mesh().is_none() {
            let Some(mesh) = filter.mesh().cloned() else { return Ok(false) };
            if mesh.indices().is_empty() {
                return Ok(false);
            }
            filter.set_gpu_mesh(self.upload_mesh(&mesh)?);
        }
        let Some(gpu) = filter.gpu_mesh() else { return Ok(false) };
        let (vertices, indices, count) = (gpu.vertices.id(), gpu.indices.id(), gpu.index_count);

        self.bind_object(&world, view_projection, color)?;
        self.device.draw_indexed(vertices, indices, count, Topology::TriangleList)?;
        Ok(true)
    }

    fn draw_lines(&mut self, scene: &mut Scene, key: GameObjectKey, view_projection: &Mat4) -> RenderResult<bool> {
        let Some(world) = scene.world_matrix(key) else { return Ok(false) };
        let Some(lines) = scene
            .game_object_mut(key)
            .and_then(|o| o.get_component_mut::<LineRenderer>())
        else {
            return Ok(false);
        };

        let count = lines.vertex_count();
        if count == 0 {
            return Ok(false);
        }

        if lines.is_dirty() {
            let bytes: &[u8] = bytemuck::cast_slice(&lines.vertices()[..count as usize]);
            let reusable = lines
                .gpu_buffer()
                .filter(|buffer| buffer.size() >= bytes.len())
                .map(GpuBuffer::id);
            let fresh = match reusable {
                Some(id) => {
                    self.device.update_buffer(id, bytes)?;
                    None
                }
                None => Some(self.create_buffer(BufferUsage::DynamicVertex, bytes)?),
            };
            match fresh {
                Some(buffer) => lines.set_gpu_buffer(buffer),
                None => lines.mark_uploaded(),
            }
        }
        let Some(buffer) = lines.gpu_buffer().map(GpuBuffer::id) else { return Ok(false) };

        self.bind_object(&world, view_projection, LINE_COLOR)?;
        self.device.draw(buffer, count, Topology::LineList)?;
        Ok(true)
    }

    fn draw_skybox(&mut self, scene: &mut Scene, key: GameObjectKey, view_projection: &Mat4, eye: &Vec3) -> RenderResult<bool> {
        if self.skybox_mesh.is_none() {
            self.skybox_mesh = Some(self.upload_mesh(&Mesh::cube())?);
        }

        let Some(skybox) = scene.game_object_mut(key).and_then(|o| o.get_component_mut::<Skybox>()) else {
            return Ok(false);
        };
        if skybox.cube_texture().is_none() {
            if let Some((width, height, pixels)) = skybox.cube_pixels() {
                let id = self.device.create_texture(width, height, 6, &pixels)?;
                skybox.set_cube_texture(GpuTexture::new(id, width, height, self.queue.clone()));
            }
        }
        let texture = skybox.cube_texture().map(GpuTexture::id);

        let world = Mat4::new_translation(eye);
        self.bind_object(&world, view_projection, [1.0; 4])?;
        if let Some(texture) = texture {
            self.device.bind_texture(SKYBOX_TEXTURE_SLOT, texture)?;
        }

        let Some(cube) = &self.skybox_mesh else { return Ok(false) };
        let (vertices, indices, count) = (cube.vertices.id(), cube.indices.id(), cube.index_count);
        self.device.draw_indexed(vertices, indices, count, Topology::TriangleList)?;
        Ok(true)
    }
}

fn gather_lights(scene: &Scene) -> LightConstants {
    let objects = scene.game_objects();
    let light_of = |key: GameObjectKey| objects.get(key).and_then(|o| o.get_component::<Light>());

    let directional: Vec<GpuDirectionalLight> = scene
        .directional_lights()
        .iter()
        .filter_map(|&key| {
            let light = light_of(key)?;
            let direction = transform::forward(objects, key)?;
            let color = light.color();
            Some(GpuDirectionalLight {
                direction: [direction.x, direction.y, direction.z, light.intensity()],
                color: [color.x, color.y, color.z, light.bias()],
            })
        })
        .collect();

    let point: Vec<GpuPointLight> = scene
        .point_lights()
        .iter()
        .filter_map(|&key| {
            let light = light_of(key)?;
            let position = transform::position(objects, key)?;
            let color = light.color();
            Some(GpuPointLight {
                position: [position.x, position.y, position.z, light.range()],
                color: [color.x, color.y, color.z, light.intensity()],
            })
        })
        .collect();

    LightConstants::new(&scene.ambient_light(), &directional, &point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::render::{DeviceCall, DeviceLog, RecordingDevice};
    use crate::resources::Primitive;
    use crate::subsystems::Subsystems;
    use std::sync::Arc;

    fn scene_with_log() -> (Scene, DeviceLog) {
        let config = EngineConfig::default();
        let device = RecordingDevice::new();
        let log = device.log();
        let subsystems = Subsystems::with_device(&config, Box::new(device)).unwrap();
        (Scene::new(config.scene.with_default_objects(false), subsystems), log)
    }

    fn render(scene: &mut Scene) -> RenderResult<()> {
        let renderer = Arc::clone(&scene.subsystems().renderer);
        let mut renderer = renderer.lock();
        renderer.render(scene)
    }

    fn add_camera(scene: &mut Scene) {
        let key = scene.create_game_object();
        let object = scene.game_object_mut(key).unwrap();
        object.add_component::<Camera>();
        object.transform_mut().set_position_local(Vec3::new(0.0, 0.0, 5.0));
    }

    fn add_cube(scene: &mut Scene) -> GameObjectKey {
        let key = scene.create_game_object();
        let object = scene.game_object_mut(key).unwrap();
        object.add_component::<MeshFilter>().unwrap().set_primitive(Primitive::Cube);
        object.add_component::<MeshRenderer>();
        key
    }

    fn pass_markers(log: &DeviceLog) -> Vec<DeviceCall> {
        log.calls()
            .into_iter()
            .filter(|c| matches!(c, DeviceCall::BeginPass(_) | DeviceCall::EndPass | DeviceCall::Present(_)))
            .collect()
    }

    #[test]
    fn test_without_camera_only_clears() {
        let (mut scene, log) = scene_with_log();
        add_cube(&mut scene);
        scene.resolve();
        log.clear();

        render(&mut scene).unwrap();
        assert_eq!(log.count(|c| matches!(c, DeviceCall::ClearTarget(_))), 1);
        assert!(pass_markers(&log).is_empty());
    }

    #[test]
    fn test_passes_run_in_order() {
        let (mut scene, log) = scene_with_log();
        add_camera(&mut scene);
        add_cube(&mut scene);
        scene.resolve();
        render(&mut scene).unwrap();

        let target = scene.subsystems().renderer.lock().frame_shader_resource().unwrap();
        assert_eq!(
            pass_markers(&log),
            vec![
                DeviceCall::BeginPass(PassKind::Depth),
                DeviceCall::EndPass,
                DeviceCall::BeginPass(PassKind::Lighting),
                DeviceCall::EndPass,
                DeviceCall::Present(target),
            ]
        );
        let stats = scene.subsystems().renderer.lock().last_frame_stats();
        assert_eq!((stats.depth_draws, stats.lit_draws), (1, 1));
    }

    #[test]
    fn test_mesh_buffers_are_created_once() {
        let (mut scene, log) = scene_with_log();
        add_camera(&mut scene);
        add_cube(&mut scene);
        scene.resolve();

        render(&mut scene).unwrap();
        render(&mut scene).unwrap();
        let mesh_buffers = log.count(|c| {
            matches!(c, DeviceCall::CreateBuffer { usage: BufferUsage::Vertex | BufferUsage::Index, .. })
        });
        assert_eq!(mesh_buffers, 2);
    }

    #[test]
    fn test_removed_filter_releases_buffers_next_frame() {
        let (mut scene, log) = scene_with_log();
        add_camera(&mut scene);
        let cube = add_cube(&mut scene);
        scene.resolve();
        render(&mut scene).unwrap();

        let removed = scene.game_object_mut(cube).unwrap().remove_component::<MeshFilter>();
        drop(removed);
        scene.resolve();
        render(&mut scene).unwrap();

        assert_eq!(log.count(|c| matches!(c, DeviceCall::ReleaseBuffer(_))), 2);
        assert_eq!(scene.subsystems().renderer.lock().last_frame_stats().released, 2);
    }

    #[test]
    fn test_dirty_lines_reuse_their_buffer() {
        let (mut scene, log) = scene_with_log();
        add_camera(&mut scene);
        let key = scene.create_game_object();
        let lines = scene.game_object_mut(key).unwrap().add_component::<LineRenderer>().unwrap();
        lines.add_line(Vec3::zeros(), Vec3::x(), crate::foundation::math::Vec4::repeat(1.0));
        lines.add_line(Vec3::zeros(), Vec3::y(), crate::foundation::math::Vec4::repeat(1.0));
        render(&mut scene).unwrap();

        let lines = scene.game_object_mut(key).unwrap().get_component_mut::<LineRenderer>().unwrap();
        assert!(!lines.is_dirty());
        lines.clear_vertices();
        lines.add_line(Vec3::zeros(), Vec3::z(), crate::foundation::math::Vec4::repeat(1.0));
        render(&mut scene).unwrap();

        let dynamic = log.count(|c| matches!(c, DeviceCall::CreateBuffer { usage: BufferUsage::DynamicVertex, .. }));
        assert_eq!(dynamic, 1);
        assert_eq!(log.count(|c| matches!(c, DeviceCall::Draw { count: 2, topology: Topology::LineList, .. })), 1);
    }

    #[test]
    fn test_resolution_changes_release_old_target() {
        let (scene, log) = scene_with_log();
        let mut renderer = scene.subsystems().renderer.lock();
        let old = renderer.frame_shader_resource().unwrap();

        renderer.set_resolution(640, 480).unwrap();
        assert!(log.contains(&DeviceCall::ReleaseTexture(old)));
        assert_ne!(renderer.frame_shader_resource(), Some(old));
        assert_eq!(renderer.resolution(), (640, 480));

        let max = renderer.max_resolution();
        assert!(matches!(renderer.set_resolution(max + 1, 480), Err(RenderError::InvalidResolution { .. })));
        assert!(renderer.set_resolution(0, 480).is_err());
        assert_eq!(renderer.resolution(), (640, 480));
    }

    #[test]
    fn test_skybox_is_drawn_last() {
        let (mut scene, log) = scene_with_log();
        add_camera(&mut scene);
        add_cube(&mut scene);
        let sky = scene.create_game_object();
        scene.game_object_mut(sky).unwrap().add_component::<Skybox>();
        scene.resolve();
        render(&mut scene).unwrap();

        let calls = log.calls();
        let last_draw = calls
            .iter()
            .rposition(|c| matches!(c, DeviceCall::DrawIndexed { .. }))
            .unwrap();
        let DeviceCall::DrawIndexed { count, .. } = calls[last_draw] else { unreachable!() };
        assert_eq!(count, Mesh::cube().index_count());
        assert!(scene.subsystems().renderer.lock().last_frame_stats().skybox_drawn);
        assert_eq!(calls[last_draw + 1], DeviceCall::EndPass);
    }
}
