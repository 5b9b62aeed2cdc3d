//! Ray casting primitives for mouse picking

use crate::foundation::math::Vec3;

/// Half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`; `None` for a zero or
    /// non-finite direction
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize(f32::EPSILON)?;
        (origin.iter().all(|c| c.is_finite()) && direction.iter().all(|c| c.is_finite()))
            .then_some(Self { origin, direction })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A bounding sphere used as a coarse pick volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Distance along `ray` to the first intersection; a ray starting inside
    /// the sphere hits at 0
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        // Solve |origin + t*direction - center|^2 = radius^2 with |direction| = 1
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        if c <= 0.0 {
            return Some(0.0);
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -b - discriminant.sqrt();
        (t >= 0.0).then_some(t)
    }
}

/// Among candidates whose sphere the ray hits, the one whose centre is
/// closest to `viewer`
pub fn pick_nearest<K: Copy>(
    ray: &Ray,
    viewer: &Vec3,
    candidates: impl IntoIterator<Item = (K, BoundingSphere)>,
) -> Option<K> {
    candidates
        .into_iter()
        .filter(|(_, sphere)| sphere.intersect_ray(ray).is_some())
        .map(|(key, sphere)| (key, (sphere.center - viewer).norm()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key)
}
