//! Top-level renderer: owns the layers and the deduplicated pipeline
//! cache, and drives one frame per `draw` call.

use glam::UVec2;
use tracing::debug;

use crate::error::RenderError;
use crate::layer::{Layer, LayerStyle};
use crate::rendering::{GlyphCell, GlyphImage, PipelineCache, Rgba};
use crate::scene::SceneNode;

/// Presentation boundary. Whatever owns the terminal (or window, or test
/// harness) implements this; the renderer never talks to a device directly.
pub trait Surface {
    /// Target resolution in glyph cells.
    fn resolution(&self) -> UVec2;

    /// Minimized surfaces skip the frame entirely.
    fn minimized(&self) -> bool {
        false
    }

    fn present(&mut self, image: &GlyphImage);
}

/// Clear state applied to the backbuffer at the start of every frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub clear_symbol: char,
    pub clear_fg: Rgba,
    pub clear_bg: Rgba,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            clear_symbol: ' ',
            clear_fg: Rgba::WHITE,
            clear_bg: Rgba::BLACK,
        }
    }
}

impl RenderConfig {
    fn clear_cell(&self) -> GlyphCell {
        GlyphCell::new(self.clear_symbol, self.clear_fg, self.clear_bg)
    }
}

pub struct Renderer {
    surface: Box<dyn Surface>,
    config: RenderConfig,
    layers: Vec<Layer>,
    pipelines: PipelineCache,
    backbuffer: GlyphImage,
}

impl Renderer {
    /// A renderer without a surface is a configuration error, not a
    /// runtime condition; fail construction outright.
    pub fn new(
        surface: Option<Box<dyn Surface>>,
        config: RenderConfig,
    ) -> Result<Self, RenderError> {
        let surface = surface.ok_or(RenderError::NoSurface)?;
        Ok(Renderer {
            surface,
            config,
            layers: Vec::new(),
            pipelines: PipelineCache::new(),
            backbuffer: GlyphImage::new(0, 0),
        })
    }

    pub fn create_layer(&mut self, style: LayerStyle) -> usize {
        let index = self.layers.len();
        self.layers.push(Layer::new(index, style));
        index
    }

    pub fn layer(&self, index: usize) -> &Layer {
        &self.layers[index]
    }

    pub fn layer_mut(&mut self, index: usize) -> &mut Layer {
        &mut self.layers[index]
    }

    pub fn pipelines(&self) -> &PipelineCache {
        &self.pipelines
    }

    pub fn backbuffer(&self) -> &GlyphImage {
        &self.backbuffer
    }

    /// Render one frame: compile and draw every layer, composite their
    /// images over the clear color, and present the result.
    pub fn draw(&mut self, scene: &SceneNode) {
        if self.surface.minimized() {
            debug!("surface minimized, frame skipped");
            return;
        }
        let resolution = self.surface.resolution().max(UVec2::ONE);

        self.backbuffer
            .resize(resolution.x as usize, resolution.y as usize);
        self.backbuffer.fill(self.config.clear_cell());

        for layer in &mut self.layers {
            layer.prepare(resolution);
            layer.generate(scene, resolution, &mut self.pipelines);
            layer.render(&mut self.pipelines);
        }
        for layer in &self.layers {
            self.backbuffer.overlay(layer.image());
        }

        self.surface.present(&self.backbuffer);
    }
}
