pub mod camera;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod light;
pub mod renderable;
pub mod renderer;
/// Glyph engine - CPU renderer that turns 3-D scenes into colored
/// terminal glyph grids, one frame per draw call
pub mod rendering;
pub mod scene;

pub use camera::{Camera, Frustum};
pub use error::RenderError;
pub use geometry::{GeometryCache, ImageData, MeshData, TextureCache, Topology, Vertex};
pub use layer::{Layer, LayerStyle};
pub use light::{Light, LightKind, LightSample};
pub use renderable::Renderable;
pub use renderer::{RenderConfig, Renderer, Surface};
pub use rendering::{
    GlyphCell, GlyphImage, PipelineCache, PipelineConfig, Rgba, Subscriber,
};
pub use scene::{InstanceSnapshot, Level, LevelRange, RenderableRef, SceneNode};
