//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and game development.
//! All spatial types are right-handed and Y-up; cameras look down -Z.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Compose a TRS matrix (translation * rotation * scale)
pub fn compose(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Extract the translation column of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Transform a point by a (possibly projective) matrix, applying the
/// perspective divide
pub fn transform_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
    let h = matrix * Vec4::new(point.x, point.y, point.z, 1.0);
    if h.w.abs() > f32::EPSILON {
        Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w)
    } else {
        Vec3::new(h.x, h.y, h.z)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Build a rotation from Euler angles given in degrees (roll about X,
    /// pitch about Y, yaw about Z)
    pub fn quat_from_euler_degrees(x: f32, y: f32, z: f32) -> Quat {
        Quat::from_euler_angles(deg_to_rad(x), deg_to_rad(y), deg_to_rad(z))
    }
}
