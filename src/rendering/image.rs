//! Glyph grid: the renderer's equivalent of a swapchain image.

use bitflags::bitflags;

use super::color::Rgba;

bitflags! {
    /// Text attributes a terminal can apply per cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Emphasis: u8 {
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const REVERSE = 1 << 4;
    }
}

/// One printable cell. The space symbol is treated as fully transparent when
/// compositing layers, so cleared cells never cover content beneath them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphCell {
    pub symbol: char,
    pub fg: Rgba,
    pub bg: Rgba,
    pub emphasis: Emphasis,
}

impl Default for GlyphCell {
    fn default() -> Self {
        GlyphCell {
            symbol: ' ',
            fg: Rgba::WHITE,
            bg: Rgba::BLACK,
            emphasis: Emphasis::empty(),
        }
    }
}

impl GlyphCell {
    pub fn new(symbol: char, fg: Rgba, bg: Rgba) -> Self {
        GlyphCell { symbol, fg, bg, emphasis: Emphasis::empty() }
    }

    /// Solid cell where both color slots carry the same pixel color.
    pub fn solid(symbol: char, color: Rgba) -> Self {
        GlyphCell::new(symbol, color, color)
    }

    pub fn is_transparent(&self) -> bool {
        self.symbol == ' '
    }
}

/// 2-D grid of glyph cells.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphImage {
    width: usize,
    height: usize,
    cells: Vec<GlyphCell>,
}

impl GlyphImage {
    pub fn new(width: usize, height: usize) -> Self {
        GlyphImage {
            width,
            height,
            cells: vec![GlyphCell::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells.clear();
            self.cells.resize(width * height, GlyphCell::default());
        }
    }

    pub fn fill(&mut self, cell: GlyphCell) {
        self.cells.fill(cell);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> GlyphCell {
        self.cells[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: GlyphCell) {
        self.cells[y * self.width + x] = cell;
    }

    pub fn cells(&self) -> &[GlyphCell] {
        &self.cells
    }

    /// Paint `other` on top of this image, skipping transparent cells.
    /// Both images must share dimensions; mismatches copy the overlap only.
    pub fn overlay(&mut self, other: &GlyphImage) {
        let w = self.width.min(other.width);
        let h = self.height.min(other.height);
        for y in 0..h {
            for x in 0..w {
                let cell = other.get(x, y);
                if !cell.is_transparent() {
                    self.set(x, y, cell);
                }
            }
        }
    }

    /// Number of cells whose foreground matches `color` exactly.
    pub fn count_fg(&self, color: Rgba) -> usize {
        self.cells
            .iter()
            .filter(|c| !c.is_transparent() && c.fg == color)
            .count()
    }
}
