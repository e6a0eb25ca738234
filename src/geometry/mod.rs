//! Mesh asset boundary and the flat vertex cache the rasterizer consumes.

mod texture;

pub use texture::{ImageData, TextureCache};

use glam::{Vec2, Vec3, Vec4};

use crate::error::RenderError;
use crate::rendering::Rgba;

/// Primitive topology of a mesh source. Only triangle lists survive the
/// trip into a [`GeometryCache`]; everything else is an explicit error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
    TriangleFan,
    LineList,
    PointList,
}

/// Vertex positions as authored. Planar meshes are promoted to `z = 0`
/// during the build; homogeneous positions are taken verbatim.
#[derive(Clone, Debug)]
pub enum PositionChannel {
    Planar(Vec<Vec2>),
    Spatial(Vec<Vec3>),
    Homogeneous(Vec<Vec4>),
}

impl PositionChannel {
    fn len(&self) -> usize {
        match self {
            PositionChannel::Planar(v) => v.len(),
            PositionChannel::Spatial(v) => v.len(),
            PositionChannel::Homogeneous(v) => v.len(),
        }
    }

    fn get(&self, i: usize) -> Vec4 {
        match self {
            PositionChannel::Planar(v) => v[i].extend(0.0).extend(1.0),
            PositionChannel::Spatial(v) => v[i].extend(1.0),
            PositionChannel::Homogeneous(v) => v[i],
        }
    }
}

/// Mesh as delivered by the asset collaborator: a topology tag plus optional
/// per-vertex channels. Channels shorter than the position channel fall back
/// to defaults per vertex rather than failing the build.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub topology: Topology,
    pub positions: Option<PositionChannel>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Rgba>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_list() -> Self {
        MeshData {
            topology: Topology::TriangleList,
            positions: None,
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Axis-aligned rectangle in the XY plane, centered at the origin.
    /// Authored planar to exercise the 2-D promotion path.
    pub fn quad(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        let corners = [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ];
        let mut mesh = MeshData::triangle_list();
        mesh.positions = Some(PositionChannel::Planar(corners.to_vec()));
        mesh.uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh
    }

    /// Axis-aligned box with per-face normals, 12 triangles.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let mut positions = Vec::with_capacity(36);
        let mut normals = Vec::with_capacity(36);
        // (normal, face basis u, face basis v)
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];
        for (n, u, v) in faces {
            let origin = n * h;
            let quad = [
                origin - u * h - v * h,
                origin + u * h - v * h,
                origin + u * h + v * h,
                origin - u * h + v * h,
            ];
            for &i in &[0usize, 1, 2, 0, 2, 3] {
                positions.push(quad[i]);
                normals.push(n);
            }
        }
        let mut mesh = MeshData::triangle_list();
        mesh.positions = Some(PositionChannel::Spatial(positions));
        mesh.normals = normals;
        mesh
    }

    pub fn with_colors(mut self, colors: Vec<Rgba>) -> Self {
        self.colors = colors;
        self
    }
}

/// One interleaved vertex as the rasterizer reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Rgba,
}

/// Flat, de-indexed triangle list built once per mesh asset and shared
/// read-only (`Arc`) across every renderable that uses the mesh.
#[derive(Clone, Debug)]
pub struct GeometryCache {
    vertices: Vec<Vertex>,
    has_vertex_colors: bool,
}

impl GeometryCache {
    pub fn build(mesh: &MeshData) -> Result<Self, RenderError> {
        if mesh.topology != Topology::TriangleList {
            return Err(RenderError::UnsupportedTopology(mesh.topology));
        }
        let positions = mesh
            .positions
            .as_ref()
            .ok_or(RenderError::MissingPositions)?;
        let count = positions.len();

        let fetch = |i: u32| -> Result<Vertex, RenderError> {
            let i = i as usize;
            if i >= count {
                return Err(RenderError::IndexOutOfBounds {
                    index: i as u32,
                    count,
                });
            }
            Ok(Vertex {
                position: positions.get(i),
                normal: mesh.normals.get(i).copied().unwrap_or(Vec3::Z),
                uv: mesh.uvs.get(i).copied().unwrap_or(Vec2::ZERO),
                color: mesh.colors.get(i).copied().unwrap_or(Rgba::WHITE),
            })
        };

        let mut vertices = Vec::new();
        if mesh.indices.is_empty() {
            vertices.reserve(count);
            for i in 0..count {
                vertices.push(fetch(i as u32)?);
            }
        } else {
            vertices.reserve(mesh.indices.len());
            for &i in &mesh.indices {
                vertices.push(fetch(i)?);
            }
        }
        // Trailing vertices that do not form a full triangle are dropped.
        vertices.truncate(vertices.len() / 3 * 3);

        let has_vertex_colors = vertices.iter().any(|v| v.color != Rgba::WHITE);
        Ok(GeometryCache { vertices, has_vertex_colors })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True when the source carried meaningful per-vertex colors, which
    /// turns on vertex-color interpolation in the default pipeline config.
    pub fn has_vertex_colors(&self) -> bool {
        self.has_vertex_colors
    }
}
