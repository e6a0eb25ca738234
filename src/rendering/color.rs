use glam::{Vec3, Vec4};

/// 8-bit RGBA color. Alpha doubles as the painted-pixel stencil inside
/// pipeline color buffers: zero alpha means nothing was rasterized there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const RED: Rgba = Rgba::new(255, 0, 0, 255);
    pub const GREEN: Rgba = Rgba::new(0, 255, 0, 255);
    pub const BLUE: Rgba = Rgba::new(0, 0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba::new(r, g, b, 255)
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    pub fn from_vec4(v: Vec4) -> Self {
        let v = v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
        Rgba::new(v.x as u8, v.y as u8, v.z as u8, v.w as u8)
    }

    /// Channel-wise multiply, used for per-instance tinting.
    pub fn modulate(self, other: Rgba) -> Rgba {
        Rgba::from_vec4(self.to_vec4() * other.to_vec4())
    }

    /// Scale only the color channels by a lighting factor, keeping alpha.
    pub fn shaded(self, light: Vec3) -> Rgba {
        let v = self.to_vec4();
        Rgba::from_vec4(Vec4::new(v.x * light.x, v.y * light.y, v.z * light.z, v.w))
    }

    /// Manhattan distance over the color channels, ignoring alpha.
    pub fn distance(self, other: Rgba) -> u32 {
        self.r.abs_diff(other.r) as u32
            + self.g.abs_diff(other.g) as u32
            + self.b.abs_diff(other.b) as u32
    }
}
