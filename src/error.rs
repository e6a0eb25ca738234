/// Error taxonomy for the glyph renderer.
///
/// Configuration errors are fatal at construction time. Everything that can
/// go wrong per renderable or per triangle is contained locally and never
/// aborts a frame; those paths log instead of returning errors.
use crate::geometry::Topology;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Raised when a renderer is constructed without a target surface.
    #[error("no target surface available; create a window before the renderer")]
    NoSurface,

    /// Only triangle lists are rasterized. Lines, strips and fans are
    /// explicitly unimplemented rather than silently misdrawn.
    #[error("unsupported mesh topology {0:?}; only triangle lists are rasterized")]
    UnsupportedTopology(Topology),

    #[error("mesh source has no vertex position channel")]
    MissingPositions,

    #[error("vertex index {index} out of bounds for {count} vertices")]
    IndexOutOfBounds { index: u32, count: usize },

    #[error("image pixel data length {len} does not match {width}x{height}")]
    ImageSizeMismatch { len: usize, width: u32, height: u32 },

    /// Styles that map several buffer pixels onto one glyph allocate their
    /// scaled buffers, but their assembly pass is not implemented.
    #[error("symbol density {x}x{y} assembly is not implemented")]
    UnimplementedSymbolDensity { x: usize, y: usize },
}
