pub mod buffer;
pub mod color;
pub mod image;
/// Rasterization pipeline and the deduplicated cache the renderer keeps
/// them in.
pub mod pipeline;
pub mod shading;

pub use buffer::PixelBuffer;
pub use color::Rgba;
pub use image::{Emphasis, GlyphCell, GlyphImage};
pub use pipeline::{
    CullMode, Pipeline, PipelineCache, PipelineConfig, PipelineId, Subscriber,
    SymbolStyle, SOLID_BLOCK,
};
pub use shading::FogConfig;
