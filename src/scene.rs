//! Scene collaborator boundary: snapshots the renderer reads each frame.
//!
//! The renderer never walks live game state. Whatever owns the world hands
//! over plain-data snapshots (instances, a tree for hierarchical draw order)
//! and the renderer compiles those into draw sequences.

use glam::Mat4;

use crate::rendering::Rgba;

/// Integer octave of physical scale. Level 0 is human scale; each step up
/// doubles the size of the world unit, each step down halves it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i32);

impl Level {
    pub const DEFAULT: Level = Level(0);

    /// Scale factor that carries a measurement from this octave into `other`.
    pub fn scale_to(self, other: Level) -> f32 {
        2f32.powi(self.0 - other.0)
    }
}

/// Inclusive range of levels, kept ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelRange {
    pub min: Level,
    pub max: Level,
}

impl Default for LevelRange {
    fn default() -> Self {
        LevelRange { min: Level::DEFAULT, max: Level::DEFAULT }
    }
}

impl LevelRange {
    pub fn new(min: Level, max: Level) -> Self {
        if min <= max {
            LevelRange { min, max }
        } else {
            LevelRange { min: max, max: min }
        }
    }

    pub fn contains(&self, level: Level) -> bool {
        self.min <= level && level <= self.max
    }

    /// Grow the range to include `level`.
    pub fn embrace(&mut self, level: Level) {
        if level < self.min {
            self.min = level;
        }
        if level > self.max {
            self.max = level;
        }
    }

    /// Iterate observable levels from the largest octave down to the
    /// smallest. Larger scales are drawn first so that nearer octaves can
    /// paint over them after the depth buffer is cleared.
    pub fn iter_descending(&self) -> impl Iterator<Item = Level> {
        let max = self.max.0;
        let min = self.min.0;
        (min..=max).rev().map(Level)
    }

    pub fn len(&self) -> usize {
        (self.max.0 - self.min.0) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Per-instance snapshot read at refresh time.
#[derive(Clone, Copy, Debug)]
pub struct InstanceSnapshot {
    pub transform: Mat4,
    /// Optional per-instance tint multiplied into the renderable color.
    pub color: Option<Rgba>,
    pub level: Level,
    /// Bounding sphere radius in world units, when known. Instances without
    /// one are never frustum-culled.
    pub bounding_radius: Option<f32>,
}

impl Default for InstanceSnapshot {
    fn default() -> Self {
        InstanceSnapshot {
            transform: Mat4::IDENTITY,
            color: None,
            level: Level::DEFAULT,
            bounding_radius: None,
        }
    }
}

impl InstanceSnapshot {
    pub fn at(transform: Mat4) -> Self {
        InstanceSnapshot { transform, ..Default::default() }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_bounding_radius(mut self, radius: f32) -> Self {
        self.bounding_radius = Some(radius);
        self
    }
}

/// Reference to a renderable owned by a specific layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderableRef {
    pub layer: usize,
    pub index: usize,
}

/// Snapshot of the scene hierarchy, used by hierarchical layers to preserve
/// authored draw order. Batched layers ignore the tree shape entirely.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub renderables: Vec<RenderableRef>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn with_renderables(renderables: Vec<RenderableRef>) -> Self {
        SceneNode { renderables, children: Vec::new() }
    }

    /// Pre-order depth-first traversal: a node's own renderables first, then
    /// each child subtree in authored order.
    pub fn walk(&self, visit: &mut impl FnMut(RenderableRef)) {
        for r in &self.renderables {
            visit(*r);
        }
        for child in &self.children {
            child.walk(visit);
        }
    }
}
