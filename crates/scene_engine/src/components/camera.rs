//! Camera component
//!
//! Holds projection parameters only. Position and orientation come from the
//! owning game object's world transform, which callers pass in.

use crate::foundation::math::{translation_of, transform_point, utils, Mat4, Point3, Vec2, Vec3, Vec4};
use crate::io::{FileStream, StreamError, StreamResult};
use crate::scene::Ray;

use super::{Component, ComponentKind, ComponentType};

/// Projection model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Perspective with a vertical field of view
    Perspective,
    /// Parallel projection with a fixed vertical extent
    Orthographic,
}

impl Projection {
    fn tag(self) -> u32 {
        match self {
            Self::Perspective => 0,
            Self::Orthographic => 1,
        }
    }

    fn from_tag(tag: u32) -> StreamResult<Self> {
        match tag {
            0 => Ok(Self::Perspective),
            1 => Ok(Self::Orthographic),
            other => Err(StreamError::InvalidValue(format!("projection tag {other}"))),
        }
    }
}

/// View into the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov_degrees: f32,
    near_plane: f32,
    far_plane: f32,
    orthographic_size: f32,
    projection: Projection,
    clear_color: Vec4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near_plane: 0.3,
            far_plane: 1000.0,
            orthographic_size: 10.0,
            projection: Projection::Perspective,
            clear_color: Vec4::new(0.396, 0.611, 0.937, 1.0),
        }
    }
}

impl Camera {
    /// Vertical field of view in degrees
    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Set the vertical field of view, clamped to (1, 179) degrees
    pub fn set_fov_degrees(&mut self, fov: f32) {
        self.fov_degrees = fov.clamp(1.0, 179.0);
    }

    /// Near clip distance
    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Far clip distance
    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// Set both clip distances; ignored unless `0 < near < far`
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        if valid_clip_planes(near, far) {
            self.near_plane = near;
            self.far_plane = far;
        } else {
            log::warn!("Ignoring invalid clip planes near={} far={}", near, far);
        }
    }

    /// Projection model
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Set the projection model
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// Vertical extent of the orthographic view volume
    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }

    /// Set the vertical extent of the orthographic view volume
    pub fn set_orthographic_size(&mut self, size: f32) {
        self.orthographic_size = size.max(f32::EPSILON);
    }

    /// Background colour of the lighting pass
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Set the background colour
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    /// World-to-view matrix for a camera placed at `world`, looking down its -Z
    pub fn view_matrix(&self, world: &Mat4) -> Mat4 {
        let eye = translation_of(world);
        let forward = world.transform_vector(&-Vec3::z()).normalize();
        let up = world.transform_vector(&Vec3::y()).normalize();
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(eye + forward), &up)
    }

    /// View-to-clip matrix for the given width / height ratio
    ///
    /// Degenerate parameters fall back to the defaults instead of producing
    /// a singular matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let defaults = Self::default();
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        let (near, far) = if valid_clip_planes(self.near_plane, self.far_plane) {
            (self.near_plane, self.far_plane)
        } else {
            (defaults.near_plane, defaults.far_plane)
        };

        match self.projection {
            Projection::Perspective => {
                let fov = if self.fov_degrees.is_finite() { self.fov_degrees.clamp(1.0, 179.0) } else { defaults.fov_degrees };
                Mat4::new_perspective(aspect, utils::deg_to_rad(fov), near, far)
            }
            Projection::Orthographic => {
                let size = if self.orthographic_size.is_finite() && self.orthographic_size > 0.0 {
                    self.orthographic_size
                } else {
                    defaults.orthographic_size
                };
                let half_height = size * 0.5;
                let half_width = half_height * aspect;
                Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    /// World-to-clip matrix
    pub fn view_projection_matrix(&self, world: &Mat4, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix(world)
    }

    /// World-space ray through a pixel of a `viewport`-sized screen
    ///
    /// `screen_point` has its origin at the top-left corner with y down. The
    /// ray starts on the near plane and points toward the far plane. Returns
    /// `None` for an empty viewport or a singular view-projection.
    pub fn screen_to_ray(&self, world: &Mat4, screen_point: &Vec2, viewport: &Vec2) -> Option<Ray> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }

        let ndc_x = 2.0 * screen_point.x / viewport.x - 1.0;
        let ndc_y = 1.0 - 2.0 * screen_point.y / viewport.y;
        let inverse = self.view_projection_matrix(world, viewport.x / viewport.y).try_inverse()?;

        let near = transform_point(&inverse, &Vec3::new(ndc_x, ndc_y, -1.0));
        let far = transform_point(&inverse, &Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(near, far - near)
    }
}

impl Component for Camera {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Camera
    }

    fn serialize(&self, stream: &mut FileStream) {
        stream.write_f32(self.fov_degrees);
        stream.write_f32(self.near_plane);
        stream.write_f32(self.far_plane);
        stream.write_f32(self.orthographic_size);
        stream.write_u32(self.projection.tag());
        stream.write_vec4(&self.clear_color);
    }

    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()> {
        let fov = stream.read_f32()?;
        let near = stream.read_f32()?;
        let far = stream.read_f32()?;
        let orthographic_size = stream.read_f32()?;
        if !(fov.is_finite() && orthographic_size.is_finite() && valid_clip_planes(near, far)) {
            return Err(StreamError::InvalidValue(format!(
                "camera fov={fov} near={near} far={far} size={orthographic_size}"
            )));
        }

        self.set_fov_degrees(fov);
        self.near_plane = near;
        self.far_plane = far;
        self.set_orthographic_size(orthographic_size);
        self.projection = Projection::from_tag(stream.read_u32()?)?;
        self.clear_color = stream.read_vec4()?;
        Ok(())
    }

    component_any!();
}

impl ComponentType for Camera {
    const KIND: ComponentKind = ComponentKind::Camera;
}

fn valid_clip_planes(near: f32, far: f32) -> bool {
    near.is_finite() && far.is_finite() && near > 0.0 && far > near
}
