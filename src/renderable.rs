//! Renderable unit: binds content (geometry, texture, color) to the world
//! through instances, and caches resolved pipelines per LOD slot.

use std::sync::Arc;

use glam::Mat4;
use tracing::warn;

use crate::geometry::{GeometryCache, TextureCache};
use crate::layer::LayerStyle;
use crate::rendering::{PipelineCache, PipelineConfig, PipelineId, Rgba};
use crate::scene::{InstanceSnapshot, Level, LevelRange};

/// Number of discrete LOD slots; one per distance octave.
pub const LOD_SLOT_COUNT: usize = 8;

/// Level-of-detail context for one compiled instance.
#[derive(Clone, Copy, Debug)]
pub struct LodState {
    pub level: Level,
    pub view: Mat4,
    pub model: Mat4,
}

impl LodState {
    /// Distance octave of the instance origin in view space, clamped to the
    /// available slots.
    pub fn index(&self) -> usize {
        let distance = (self.view * self.model).w_axis.truncate().length();
        if distance <= 1.0 {
            0
        } else {
            (distance.log2().floor() as usize).min(LOD_SLOT_COUNT - 1)
        }
    }
}

#[derive(Clone, Default)]
struct LodSlot {
    geometry: Option<Arc<GeometryCache>>,
    texture: Option<Arc<TextureCache>>,
    pipeline: Option<PipelineId>,
}

/// Content bound into the world. Without instances the renderable still
/// draws once, untransformed, at the default level.
#[derive(Clone)]
pub struct Renderable {
    pub color: Rgba,
    pub geometry: Option<Arc<GeometryCache>>,
    pub texture: Option<Arc<TextureCache>>,
    pub instances: Vec<InstanceSnapshot>,
    /// Union of instance levels, refreshed with the snapshot.
    pub level_range: LevelRange,
    /// Overrides the derived pipeline configuration when set.
    pub pipeline_override: Option<PipelineConfig>,

    slots: [LodSlot; LOD_SLOT_COUNT],
}

impl Renderable {
    pub fn new(color: Rgba) -> Self {
        Renderable {
            color,
            geometry: None,
            texture: None,
            instances: Vec::new(),
            level_range: LevelRange::default(),
            pipeline_override: None,
            slots: Default::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: Arc<GeometryCache>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_texture(mut self, texture: Arc<TextureCache>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_instances(mut self, instances: Vec<InstanceSnapshot>) -> Self {
        self.refresh(instances);
        self
    }

    /// Replace the instance snapshot (called on scene topology changes) and
    /// drop every cached LOD resolution.
    pub fn refresh(&mut self, instances: Vec<InstanceSnapshot>) {
        self.level_range = LevelRange::default();
        for instance in &instances {
            self.level_range.embrace(instance.level);
        }
        self.instances = instances;
        self.slots = Default::default();
    }

    /// Resolved geometry for a LOD slot. A single-resolution asset serves
    /// every slot; the cache exists so richer assets can swap content per
    /// octave without touching the compile loop.
    pub fn geometry_for(&mut self, lod: &LodState) -> Option<Arc<GeometryCache>> {
        let slot = &mut self.slots[lod.index()];
        if slot.geometry.is_none() {
            slot.geometry = self.geometry.clone();
        }
        slot.geometry.clone()
    }

    pub fn texture_for(&mut self, lod: &LodState) -> Option<Arc<TextureCache>> {
        let slot = &mut self.slots[lod.index()];
        if slot.texture.is_none() {
            slot.texture = self.texture.clone();
        }
        slot.texture.clone()
    }

    /// Pipeline for a LOD slot, resolving through the renderer's dedup
    /// cache on first use. Returns `None` when there is no content to
    /// build a pipeline from.
    pub fn pipeline_for(
        &mut self,
        lod: &LodState,
        style: LayerStyle,
        cache: &mut PipelineCache,
    ) -> Option<PipelineId> {
        if let Some(id) = self.slots[lod.index()].pipeline {
            return Some(id);
        }
        if self.geometry.is_none() && self.texture.is_none() {
            warn!("no contents available for generating pipeline");
            return None;
        }

        let config = match self.pipeline_override {
            Some(config) => config,
            None => {
                let mut config = PipelineConfig {
                    // Hierarchical layers rely on draw order, not depth.
                    depth_test: !style.contains(LayerStyle::HIERARCHICAL),
                    ..PipelineConfig::default()
                };
                if let Some(geometry) = &self.geometry {
                    config.colorize = geometry.has_vertex_colors();
                }
                config
            }
        };

        let id = cache.get_or_create(config);
        self.slots[lod.index()].pipeline = Some(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;
    use glam::Vec3;

    fn quad() -> Arc<GeometryCache> {
        Arc::new(GeometryCache::build(&MeshData::quad(1.0, 1.0)).unwrap())
    }

    fn default_lod() -> LodState {
        LodState { level: Level::DEFAULT, view: Mat4::IDENTITY, model: Mat4::IDENTITY }
    }

    #[test]
    fn lod_index_grows_with_distance() {
        let near = LodState {
            level: Level::DEFAULT,
            view: Mat4::IDENTITY,
            model: Mat4::from_translation(Vec3::new(0.0, 0.0, -1.5)),
        };
        let far = LodState {
            level: Level::DEFAULT,
            view: Mat4::IDENTITY,
            model: Mat4::from_translation(Vec3::new(0.0, 0.0, -200.0)),
        };
        assert!(near.index() < far.index());
        assert!(far.index() < LOD_SLOT_COUNT);
    }

    #[test]
    fn contentless_renderable_yields_no_pipeline() {
        let mut cache = PipelineCache::new();
        let mut renderable = Renderable::new(Rgba::WHITE);
        let id = renderable.pipeline_for(&default_lod(), LayerStyle::default(), &mut cache);
        assert!(id.is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn pipeline_resolution_is_cached_per_slot() {
        let mut cache = PipelineCache::new();
        let mut renderable = Renderable::new(Rgba::WHITE).with_geometry(quad());
        let first = renderable
            .pipeline_for(&default_lod(), LayerStyle::default(), &mut cache)
            .unwrap();
        let second = renderable
            .pipeline_for(&default_lod(), LayerStyle::default(), &mut cache)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn hierarchical_layers_disable_depth_testing() {
        let mut cache = PipelineCache::new();
        let mut renderable = Renderable::new(Rgba::WHITE).with_geometry(quad());
        let id = renderable
            .pipeline_for(&default_lod(), LayerStyle::HIERARCHICAL, &mut cache)
            .unwrap();
        assert!(!cache.get(id).config().depth_test);
    }

    #[test]
    fn refresh_updates_level_range_and_drops_slots() {
        let mut cache = PipelineCache::new();
        let mut renderable = Renderable::new(Rgba::WHITE).with_geometry(quad());
        renderable
            .pipeline_for(&default_lod(), LayerStyle::default(), &mut cache)
            .unwrap();
        renderable.refresh(vec![
            InstanceSnapshot::default().with_level(Level(2)),
            InstanceSnapshot::default().with_level(Level(-1)),
        ]);
        assert!(renderable.level_range.contains(Level(2)));
        assert!(renderable.level_range.contains(Level(-1)));
        assert!(renderable.slots[0].pipeline.is_none());
    }
}
