//! Shading helpers shared by the rasterizer: diffuse light accumulation and
//! depth fog.

use glam::Vec3;

use super::color::Rgba;
use crate::light::{LightKind, LightSample};

/// Base illumination applied before any light contributes, so lit faces
/// turned away from every light stay readable in glyph output.
pub const AMBIENT: f32 = 0.35;

/// Depth-fog parameters. `start`/`end` are normalized depths; pixels past
/// `end` collapse to the fog color outright.
#[derive(Clone, Copy, Debug)]
pub struct FogConfig {
    pub color: Rgba,
    pub start: f32,
    pub end: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        FogConfig { color: Rgba::opaque(24, 24, 32), start: 0.8, end: 1.0 }
    }
}

impl FogConfig {
    /// Blend factor in [0,1]; 1 means fully fogged.
    pub fn factor(&self, depth: f32) -> f32 {
        if self.end <= self.start {
            return if depth >= self.end { 1.0 } else { 0.0 };
        }
        ((depth - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}

/// Diffuse factor a single light contributes at a surface point.
pub fn light_contribution(light: &LightSample, normal: Vec3, surface: Vec3) -> f32 {
    match light.kind {
        LightKind::Directional | LightKind::Spot => {
            normal.dot(-light.direction).max(0.0)
        }
        LightKind::Point => {
            let to_light = (light.position - surface).normalize_or_zero();
            normal.dot(to_light).max(0.0)
        }
        // Filtered out during light compilation.
        LightKind::Domain => 0.0,
    }
}

/// Accumulated illumination at a surface point, clamped to [0,1] per
/// channel. With no lights bound the surface is left unmodulated.
pub fn accumulate(lights: &[LightSample], normal: Vec3, surface: Vec3) -> Vec3 {
    if lights.is_empty() {
        return Vec3::ONE;
    }
    let mut total = Vec3::splat(AMBIENT);
    for light in lights {
        total += light.color * light_contribution(light, normal, surface);
    }
    total.clamp(Vec3::ZERO, Vec3::ONE)
}
