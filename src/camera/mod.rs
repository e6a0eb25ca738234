//! Camera unit: projection, per-level view transforms and the frustum used
//! for bounding-sphere culling during scene compilation.

use glam::{Mat4, UVec2, Vec3, Vec4};

use crate::scene::{InstanceSnapshot, Level, LevelRange};

/// Fixed depth band of the orthographic fallback projection, in world units
/// either side of the z = 0 plane.
const ORTHO_DEPTH_BAND: f32 = 100.0;

#[derive(Clone, Debug)]
pub struct Camera {
    /// Perspective when true, pixel-grid orthographic otherwise.
    pub perspective: bool,
    /// Vertical field of view in radians (perspective only).
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Octaves this camera can observe; multilevel layers iterate them.
    pub observable_range: LevelRange,
    /// Instances binding the camera into the world. Only the first is used
    /// for the view transform; extras are ignored.
    pub instances: Vec<InstanceSnapshot>,

    resolution: UVec2,
    aspect: f32,
    projection: Mat4,
    projection_inverse: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            perspective: true,
            fov: 90f32.to_radians(),
            near: 0.1,
            far: 750.0,
            observable_range: LevelRange::default(),
            instances: Vec::new(),
            resolution: UVec2::ONE,
            aspect: 1.0,
            projection: Mat4::IDENTITY,
            projection_inverse: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Orthographic camera mapping world units straight to pixels, origin at
    /// the top-left, y growing downward. Used as the layer fallback.
    pub fn orthographic() -> Self {
        Camera { perspective: false, ..Camera::default() }
    }

    /// Recompute the projection for a target resolution. Zero dimensions are
    /// clamped to one pixel rather than failing the frame.
    pub fn compile(&mut self, resolution: UVec2) {
        self.resolution = resolution.max(UVec2::ONE);
        self.aspect = self.resolution.x as f32 / self.resolution.y as f32;
        self.projection = if self.perspective {
            Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
        } else {
            Mat4::orthographic_rh_gl(
                0.0,
                self.resolution.x as f32,
                self.resolution.y as f32,
                0.0,
                -ORTHO_DEPTH_BAND,
                ORTHO_DEPTH_BAND,
            )
        };
        self.projection_inverse = self.projection.inverse();
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn projection_inverse(&self) -> Mat4 {
        self.projection_inverse
    }

    /// View matrix for observing a given octave: the inverse of the first
    /// instance's world transform with its translation rescaled into the
    /// target octave. Identity when the camera is not bound to the world.
    pub fn view_transform(&self, level: Level) -> Mat4 {
        let Some(instance) = self.instances.first() else {
            return Mat4::IDENTITY;
        };
        let factor = instance.level.scale_to(level);
        let mut world = instance.transform;
        world.w_axis = (world.w_axis.truncate() * factor).extend(1.0);
        world.inverse()
    }

    /// Replace the instance snapshot (called on scene topology changes).
    pub fn refresh(&mut self, instances: Vec<InstanceSnapshot>) {
        self.instances = instances;
    }

    pub fn frustum(&self, level: Level) -> Frustum {
        Frustum::from_view_projection(&(self.projection * self.view_transform(level)))
    }
}

/// View frustum as six inward-facing planes extracted from a combined
/// view-projection matrix (Gribb/Hartmann).
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 + r2, // near
            r3 - r2, // far
        ];
        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > f32::EPSILON {
                *plane /= len;
            }
        }
        Frustum { planes }
    }

    /// Sphere-vs-frustum test; conservative (true on intersection).
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p.truncate().dot(center) + p.w >= -radius)
    }
}
