//! Light units and the per-frame samples the rasterizer shades with.

use glam::{Mat4, Vec3};
use tracing::error;

use crate::rendering::Rgba;
use crate::scene::InstanceSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
    /// Volumetric domain lighting is not implemented; compiling one logs an
    /// error and the light is skipped.
    Domain,
}

/// Projection parameters per light kind, carried for shadow mapping even
/// though no shadow pass exists yet.
#[derive(Clone, Copy, Debug)]
pub enum LightProjection {
    Orthographic { extent: f32, near: f32, far: f32 },
    Perspective { fov: f32, near: f32, far: f32 },
    Cube { near: f32, far: f32 },
}

/// A light unit. Direction and position come from the first bound instance;
/// an unbound light sits at the origin shining down -Z.
#[derive(Clone, Debug)]
pub struct Light {
    pub kind: LightKind,
    pub color: Rgba,
    pub projection: LightProjection,
    pub instances: Vec<InstanceSnapshot>,
}

impl Light {
    pub fn directional(color: Rgba) -> Self {
        Light {
            kind: LightKind::Directional,
            color,
            projection: LightProjection::Orthographic {
                extent: 50.0,
                near: 0.1,
                far: 200.0,
            },
            instances: Vec::new(),
        }
    }

    pub fn point(color: Rgba) -> Self {
        Light {
            kind: LightKind::Point,
            color,
            projection: LightProjection::Cube { near: 0.1, far: 100.0 },
            instances: Vec::new(),
        }
    }

    pub fn spot(color: Rgba, fov: f32) -> Self {
        Light {
            kind: LightKind::Spot,
            color,
            projection: LightProjection::Perspective { fov, near: 0.1, far: 100.0 },
            instances: Vec::new(),
        }
    }

    fn transform(&self) -> Mat4 {
        self.instances
            .first()
            .map(|i| i.transform)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// World-space forward axis of the light.
    pub fn direction(&self) -> Vec3 {
        let dir = self.transform().transform_vector3(Vec3::NEG_Z);
        dir.normalize_or_zero()
    }

    pub fn position(&self) -> Vec3 {
        self.transform().w_axis.truncate()
    }

    /// Shadow-map projection for this light. One face for directional and
    /// spot lights; point lights would render six of these around the cube.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            LightProjection::Orthographic { extent, near, far } => {
                Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, near, far)
            }
            LightProjection::Perspective { fov, near, far } => {
                Mat4::perspective_rh_gl(fov, 1.0, near, far)
            }
            LightProjection::Cube { near, far } => {
                Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, near, far)
            }
        }
    }

    /// Flatten into the plain-data sample the rasterizer reads. Domain
    /// lights have no sample.
    pub fn sample(&self) -> Option<LightSample> {
        if self.kind == LightKind::Domain {
            error!("domain lights are not implemented; light skipped");
            return None;
        }
        Some(LightSample {
            kind: self.kind,
            color: self.color.to_vec4().truncate(),
            direction: self.direction(),
            position: self.position(),
        })
    }
}

/// Per-frame snapshot of one light, in world space.
#[derive(Clone, Copy, Debug)]
pub struct LightSample {
    pub kind: LightKind,
    pub color: Vec3,
    pub direction: Vec3,
    pub position: Vec3,
}
