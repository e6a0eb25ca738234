use glam::Vec2;

use crate::error::RenderError;
use crate::rendering::Rgba;

/// Raw RGBA pixel grid as delivered by the asset collaborator.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba>,
}

impl ImageData {
    /// Two-color checker pattern, handy for demos and uv tests.
    pub fn checker(width: u32, height: u32, a: Rgba, b: Rgba) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(if (x + y) % 2 == 0 { a } else { b });
            }
        }
        ImageData { width, height, pixels }
    }
}

/// Validated texture shared read-only across renderables. Sampling is
/// nearest-neighbor with wrapping uv, matching the renderer's blocky output.
#[derive(Clone, Debug)]
pub struct TextureCache {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl TextureCache {
    pub fn build(image: &ImageData) -> Result<Self, RenderError> {
        let expected = (image.width as usize) * (image.height as usize);
        if image.pixels.len() != expected || expected == 0 {
            return Err(RenderError::ImageSizeMismatch {
                len: image.pixels.len(),
                width: image.width,
                height: image.height,
            });
        }
        Ok(TextureCache {
            width: image.width,
            height: image.height,
            pixels: image.pixels.clone(),
        })
    }

    pub fn sample(&self, uv: Vec2) -> Rgba {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}
