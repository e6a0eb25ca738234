//! Render layer: compiles the scene into per-frame draw sequences and runs
//! them through the pipeline cache into a glyph image.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use bitflags::bitflags;
use glam::{Mat4, UVec2};
use tracing::error;

use crate::camera::{Camera, Frustum};
use crate::light::{Light, LightSample};
use crate::renderable::{LodState, Renderable};
use crate::rendering::{
    GlyphCell, GlyphImage, PipelineCache, PipelineId, PixelBuffer, Subscriber,
};
use crate::scene::{Level, SceneNode};

/// Camera slot used when a layer has no camera bound: a compiled-on-demand
/// orthographic camera mapping world units to pixels.
pub const FALLBACK_CAMERA: usize = usize::MAX;

bitflags! {
    /// How a layer orders its draws.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LayerStyle: u8 {
        /// Preserve scene-hierarchy order instead of batching by pipeline.
        /// Pipelines default to depth-test off under this style.
        const HIERARCHICAL = 1 << 0;
        /// Iterate every observable camera level, largest octave first.
        const MULTILEVEL = 1 << 1;
        /// Sort batched subscribers back-to-front by view-space depth.
        const SORTED = 1 << 2;
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        LayerStyle::MULTILEVEL
    }
}

/// Batched draws: camera, then level (descending), then pipeline, each with
/// its subscriber list. Relative order inside a bucket is compile order.
pub type BatchSequence =
    BTreeMap<usize, BTreeMap<Reverse<Level>, BTreeMap<PipelineId, Vec<Subscriber>>>>;

/// Hierarchical draws: camera, then level (descending), then the exact
/// (pipeline, subscriber) order produced by the scene traversal.
pub type HierarchicalSequence =
    BTreeMap<usize, BTreeMap<Reverse<Level>, Vec<(PipelineId, Subscriber)>>>;

pub struct Layer {
    pub style: LayerStyle,
    pub cameras: Vec<Camera>,
    pub renderables: Vec<Renderable>,
    pub lights: Vec<Light>,

    index: usize,
    fallback: Camera,
    batch: BatchSequence,
    hierarchy: HierarchicalSequence,
    /// Cross-pipeline occlusion buffer, cleared between levels.
    depth: PixelBuffer<f32>,
    image: GlyphImage,
    light_samples: Vec<LightSample>,
}

impl Layer {
    pub fn new(index: usize, style: LayerStyle) -> Self {
        Layer {
            style,
            cameras: Vec::new(),
            renderables: Vec::new(),
            lights: Vec::new(),
            index,
            fallback: Camera::orthographic(),
            batch: BatchSequence::new(),
            hierarchy: HierarchicalSequence::new(),
            depth: PixelBuffer::new(0, 0, 1.0),
            image: GlyphImage::new(0, 0),
            light_samples: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn image(&self) -> &GlyphImage {
        &self.image
    }

    pub fn batch(&self) -> &BatchSequence {
        &self.batch
    }

    pub fn hierarchy(&self) -> &HierarchicalSequence {
        &self.hierarchy
    }

    /// Frame setup: match buffers to the surface resolution and wipe them.
    pub fn prepare(&mut self, resolution: UVec2) {
        let resolution = resolution.max(UVec2::ONE);
        let w = resolution.x as usize;
        let h = resolution.y as usize;
        self.depth.resize(w, h, 1.0);
        self.depth.fill(1.0);
        self.image.resize(w, h);
        self.image.fill(GlyphCell::default());
    }

    fn camera(&self, id: usize) -> &Camera {
        if id == FALLBACK_CAMERA {
            &self.fallback
        } else {
            &self.cameras[id]
        }
    }

    /// Compile the scene into draw sequences. Cameras are compiled first;
    /// without any, the fallback orthographic camera observes the default
    /// level. Multilevel layers walk each camera's observable range from
    /// the largest octave down.
    ///
    /// Pipeline buffers are shared across layers; resetting them here
    /// gives every layer a clean slate and sizes pipelines created during
    /// compilation.
    pub fn generate(
        &mut self,
        scene: &SceneNode,
        resolution: UVec2,
        pipelines: &mut PipelineCache,
    ) {
        self.batch.clear();
        self.hierarchy.clear();
        pipelines.resize_and_clear(resolution);

        for camera in &mut self.cameras {
            camera.compile(resolution);
        }
        self.fallback.compile(resolution);
        self.light_samples = self.lights.iter().filter_map(Light::sample).collect();

        if self.cameras.is_empty() {
            self.compile_level(FALLBACK_CAMERA, Level::DEFAULT, scene, pipelines);
        } else {
            for cam_id in 0..self.cameras.len() {
                if self.style.contains(LayerStyle::MULTILEVEL) {
                    let range = self.cameras[cam_id].observable_range;
                    for level in range.iter_descending() {
                        self.compile_level(cam_id, level, scene, pipelines);
                    }
                } else if self.cameras[cam_id]
                    .observable_range
                    .contains(Level::DEFAULT)
                {
                    self.compile_level(cam_id, Level::DEFAULT, scene, pipelines);
                }
            }
        }

        if self.style.contains(LayerStyle::SORTED)
            && !self.style.contains(LayerStyle::HIERARCHICAL)
        {
            self.sort_batches();
        }
    }

    fn compile_level(
        &mut self,
        cam_id: usize,
        level: Level,
        scene: &SceneNode,
        pipelines: &mut PipelineCache,
    ) {
        let view = self.camera(cam_id).view_transform(level);
        let frustum = {
            let cam = self.camera(cam_id);
            Frustum::from_view_projection(&(cam.projection() * view))
        };

        if self.style.contains(LayerStyle::HIERARCHICAL) {
            let own = self.index;
            let mut order = Vec::new();
            scene.walk(&mut |r| {
                if r.layer == own {
                    order.push(r.index);
                }
            });
            for index in order {
                if index < self.renderables.len() {
                    self.compile_instances(cam_id, level, &view, &frustum, index, pipelines);
                }
            }
        } else {
            for index in 0..self.renderables.len() {
                self.compile_instances(cam_id, level, &view, &frustum, index, pipelines);
            }
        }
    }

    fn compile_instances(
        &mut self,
        cam_id: usize,
        level: Level,
        view: &Mat4,
        frustum: &Frustum,
        index: usize,
        pipelines: &mut PipelineCache,
    ) {
        if self.renderables[index].instances.is_empty() {
            // Instance-less content draws once, untransformed, at the
            // default level only.
            if level == Level::DEFAULT {
                self.commit(cam_id, level, view, Mat4::IDENTITY, None, index, pipelines);
            }
            return;
        }

        for i in 0..self.renderables[index].instances.len() {
            let instance = self.renderables[index].instances[i];
            if instance.level != level {
                continue;
            }
            if let Some(radius) = instance.bounding_radius {
                let center = instance.transform.w_axis.truncate();
                if !frustum.contains_sphere(center, radius) {
                    continue;
                }
            }
            self.commit(
                cam_id,
                level,
                view,
                instance.transform,
                instance.color,
                index,
                pipelines,
            );
        }
    }

    fn commit(
        &mut self,
        cam_id: usize,
        level: Level,
        view: &Mat4,
        transform: Mat4,
        tint: Option<crate::rendering::Rgba>,
        index: usize,
        pipelines: &mut PipelineCache,
    ) {
        let lod = LodState { level, view: *view, model: transform };
        let style = self.style;
        let renderable = &mut self.renderables[index];
        let Some(pipeline) = renderable.pipeline_for(&lod, style, pipelines) else {
            return;
        };
        let geometry = renderable.geometry_for(&lod);
        let texture = renderable.texture_for(&lod);
        let mut color = renderable.color;
        if let Some(tint) = tint {
            color = color.modulate(tint);
        }
        let subscriber = Subscriber { color, transform, geometry, texture };

        if style.contains(LayerStyle::HIERARCHICAL) {
            self.hierarchy
                .entry(cam_id)
                .or_default()
                .entry(Reverse(level))
                .or_default()
                .push((pipeline, subscriber));
        } else {
            self.batch
                .entry(cam_id)
                .or_default()
                .entry(Reverse(level))
                .or_default()
                .entry(pipeline)
                .or_default()
                .push(subscriber);
        }
    }

    /// Back-to-front ordering within each batched bucket.
    fn sort_batches(&mut self) {
        let mut batch = std::mem::take(&mut self.batch);
        for (&cam_id, levels) in batch.iter_mut() {
            for (&Reverse(level), pipes) in levels.iter_mut() {
                let view = self.camera(cam_id).view_transform(level);
                for subscribers in pipes.values_mut() {
                    subscribers.sort_by(|a, b| {
                        // View space looks down -Z; larger distance first.
                        let da = -(view * a.transform.w_axis).z;
                        let db = -(view * b.transform.w_axis).z;
                        db.total_cmp(&da)
                    });
                }
            }
        }
        self.batch = batch;
    }

    /// Run the compiled sequences. Levels are drawn largest octave first
    /// and the occlusion buffer is cleared at every level boundary except
    /// the last, so depth never leaks between octaves.
    pub fn render(&mut self, pipelines: &mut PipelineCache) {
        if self.style.contains(LayerStyle::HIERARCHICAL) {
            self.render_hierarchical(pipelines);
        } else {
            self.render_batched(pipelines);
        }
    }

    fn render_batched(&mut self, pipelines: &mut PipelineCache) {
        let batch = std::mem::take(&mut self.batch);
        for (&cam_id, levels) in &batch {
            let level_count = levels.len();
            for (i, (&Reverse(level), pipes)) in levels.iter().enumerate() {
                let projected_view = {
                    let cam = self.camera(cam_id);
                    cam.projection() * cam.view_transform(level)
                };
                for (&pipeline_id, subscribers) in pipes {
                    let pipeline = pipelines.get_mut(pipeline_id);
                    for subscriber in subscribers {
                        pipeline.render(
                            &mut self.depth,
                            &projected_view,
                            subscriber,
                            &self.light_samples,
                        );
                    }
                    if let Err(e) = pipeline.assemble(&mut self.image) {
                        error!("glyph assembly failed: {e}");
                    }
                }
                if i + 1 != level_count {
                    // Neither occlusion nor pixel residue may cross the
                    // level boundary; assembly already captured this level.
                    self.depth.fill(1.0);
                    pipelines.clear_all();
                }
            }
        }
        self.batch = batch;
    }

    fn render_hierarchical(&mut self, pipelines: &mut PipelineCache) {
        let hierarchy = std::mem::take(&mut self.hierarchy);
        for (&cam_id, levels) in &hierarchy {
            let level_count = levels.len();
            for (i, (&Reverse(level), draws)) in levels.iter().enumerate() {
                let projected_view = {
                    let cam = self.camera(cam_id);
                    cam.projection() * cam.view_transform(level)
                };
                // Assembly runs per draw so later draws paint over earlier
                // ones in authored order.
                for (pipeline_id, subscriber) in draws {
                    let pipeline = pipelines.get_mut(*pipeline_id);
                    pipeline.render(
                        &mut self.depth,
                        &projected_view,
                        subscriber,
                        &self.light_samples,
                    );
                    if let Err(e) = pipeline.assemble(&mut self.image) {
                        error!("glyph assembly failed: {e}");
                    }
                }
                if i + 1 != level_count {
                    self.depth.fill(1.0);
                    pipelines.clear_all();
                }
            }
        }
        self.hierarchy = hierarchy;
    }
}
