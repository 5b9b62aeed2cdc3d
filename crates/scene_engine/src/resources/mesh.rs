//! Triangle meshes, built-in primitives and the OBJ loader

use bytemuck::{Pod, Zeroable};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{Resource, ResourceError, ResourceKind, ResourceResult};
use crate::foundation::math::{constants::PI, Vec3};

/// Vertex layout shared by every mesh: position, normal, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],
    /// Unit normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }
}

/// Axis-aligned bounding box in object space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self { min: Vec3::zeros(), max: Vec3::zeros() }
    }
}

impl BoundingBox {
    /// Create a box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or the empty default when there
    /// are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        let first = Vec3::from(*first);
        points.fold(Self::new(first, first), |mut bounds, p| {
            let p = Vec3::from(*p);
            bounds.min = bounds.min.inf(&p);
            bounds.max = bounds.max.sup(&p);
            bounds
        })
    }

    /// Centre point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size along each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners; the first four share `min.z`
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }
}

/// Built-in meshes generated without touching disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Unit cube centred on the origin
    Cube,
    /// Unit quad in the XY plane facing +Z
    Quad,
    /// Sphere of radius 0.5
    Sphere,
}

impl Primitive {
    /// Stable tag written to scene files
    pub fn tag(self) -> u32 {
        match self {
            Self::Cube => 0,
            Self::Quad => 1,
            Self::Sphere => 2,
        }
    }

    /// Inverse of [`Primitive::tag`]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Cube),
            1 => Some(Self::Quad),
            2 => Some(Self::Sphere),
            _ => None,
        }
    }

    /// Generate the mesh
    pub fn mesh(self) -> Mesh {
        match self {
            Self::Cube => Mesh::cube(),
            Self::Quad => Mesh::quad(),
            Self::Sphere => Mesh::sphere(24, 16),
        }
    }
}

/// Indexed triangle list with its object-space bounds
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounding_box: BoundingBox,
}

impl Mesh {
    /// Create a mesh, computing its bounding box
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounding_box = BoundingBox::from_points(vertices.iter().map(|v| &v.position));
        Self { vertices, indices, bounding_box }
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Object-space bounds
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Number of indices as the draw count
    pub fn index_count(&self) -> u32 {
        u32::try_from(self.indices.len()).unwrap_or(u32::MAX)
    }

    /// Unit cube, four vertices per face so normals stay flat
    pub fn cube() -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, u axis, v axis
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            let base = u32::try_from(vertices.len()).unwrap_or(0);
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * 0.5;
                vertices.push(Vertex::new(p.into(), normal, [(su + 1.0) * 0.5, (1.0 - sv) * 0.5]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// Unit quad in the XY plane
    pub fn quad() -> Self {
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex::new([-0.5, -0.5, 0.0], normal, [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], normal, [1.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.0], normal, [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.0], normal, [0.0, 0.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// UV sphere of radius 0.5
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let phi = u * 2.0 * PI;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                vertices.push(Vertex::new((normal * 0.5).into(), normal.into(), [u, v]));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::new(vertices, indices)
    }

    /// Parse Wavefront OBJ text; polygons are fan-triangulated
    pub fn from_obj_reader(reader: impl BufRead, origin: &str) -> ResourceResult<Self> {
        let parse_error = |message: String| ResourceError::Parse { path: origin.to_string(), message };

        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else { continue };
            let values: Vec<&str> = parts.collect();

            let floats = |count: usize| -> ResourceResult<Vec<f32>> {
                if values.len() < count {
                    return Err(parse_error(format!("line {}: expected {count} values", line_number + 1)));
                }
                values[..count]
                    .iter()
                    .map(|v| v.parse::<f32>().map_err(|e| parse_error(format!("line {}: {e}", line_number + 1))))
                    .collect()
            };

            match keyword {
                "v" => {
                    let v = floats(3)?;
                    positions.push([v[0], v[1], v[2]]);
                }
                "vn" => {
                    let v = floats(3)?;
                    normals.push([v[0], v[1], v[2]]);
                }
                "vt" => {
                    let v = floats(2)?;
                    tex_coords.push([v[0], v[1]]);
                }
                "f" => {
                    if values.len() < 3 {
                        return Err(parse_error(format!("line {}: face needs 3 vertices", line_number + 1)));
                    }
                    let first = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
                    for corner in &values {
                        let mut refs = corner.split('/');
                        let index = |value: Option<&str>| -> Option<usize> {
                            value.filter(|s| !s.is_empty())?.parse::<usize>().ok()?.checked_sub(1)
                        };
                        let position = index(refs.next())
                            .and_then(|i| positions.get(i))
                            .ok_or_else(|| parse_error(format!("line {}: bad position index", line_number + 1)))?;
                        let tex_coord = index(refs.next()).and_then(|i| tex_coords.get(i)).copied().unwrap_or([0.0, 0.0]);
                        let normal = index(refs.next()).and_then(|i| normals.get(i)).copied().unwrap_or([0.0, 1.0, 0.0]);
                        vertices.push(Vertex::new(*position, normal, tex_coord));
                    }
                    let count = u32::try_from(values.len()).unwrap_or(u32::MAX);
                    for i in 1..count - 1 {
                        indices.extend_from_slice(&[first, first + i, first + i + 1]);
                    }
                }
                // Groups, objects, smoothing and material references are ignored
                _ => {}
            }
        }

        if vertices.is_empty() {
            return Err(parse_error("no faces found".to_string()));
        }
        Ok(Self::new(vertices, indices))
    }
}

impl Resource for Mesh {
    const KIND: ResourceKind = ResourceKind::Mesh;

    fn load_from_file(path: &Path) -> ResourceResult<Self> {
        let name = path.display().to_string();
        if !super::is_supported_mesh_file(&name) {
            return Err(ResourceError::Unsupported(name));
        }
        let mesh = Self::from_obj_reader(BufReader::new(File::open(path)?), &name)?;
        log::debug!("Loaded mesh {} ({} vertices, {} indices)", name, mesh.vertices.len(), mesh.indices.len());
        Ok(mesh)
    }
}
