//! Rasterization pipeline: near-plane clipping, perspective-correct
//! scanline fill with depth testing and shading, and the glyph assembly
//! pass that turns pixel buffers into printable cells.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat3, Mat4, UVec2, Vec2, Vec3, Vec4};
use tracing::{debug, trace};

use super::buffer::PixelBuffer;
use super::color::Rgba;
use super::image::{GlyphCell, GlyphImage};
use super::shading::{self, FogConfig};
use crate::error::RenderError;
use crate::geometry::{GeometryCache, TextureCache};
use crate::light::LightSample;

/// Vertices with |w| under this are unprojectable and skip their triangle.
const W_EPS: f32 = 1e-4;
/// Near-plane clip threshold on `z + w`.
const NEAR_EPS: f32 = 1e-4;
/// Minimum doubled screen-space area; below this a triangle covers nothing.
const AREA_EPS: f32 = 1e-8;

/// Depth step that counts as a ridge or valley during glyph selection.
const RIDGE_EPS: f32 = 0.003;
/// Maximum channel-sum color distance along a candidate glyph line.
const COLOR_EPS: u32 = 96;

pub const SOLID_BLOCK: char = '█';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

/// How pipeline pixels map onto glyphs. Anything denser than 1:1 allocates
/// scaled buffers but has no assembly pass yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SymbolStyle {
    Text,
    #[default]
    FullBlocks,
    HalfBlocks,
    Braille,
}

impl SymbolStyle {
    /// Pixels per glyph cell, (x, y).
    pub fn density(self) -> (usize, usize) {
        match self {
            SymbolStyle::Text | SymbolStyle::FullBlocks => (1, 1),
            SymbolStyle::HalfBlocks => (2, 2),
            SymbolStyle::Braille => (2, 4),
        }
    }
}

/// Deduplication key for pipelines: two renderables with the same
/// configuration share one pipeline and its buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineConfig {
    pub cull: CullMode,
    pub depth_test: bool,
    pub lit: bool,
    /// Per-pixel normal interpolation instead of one normal per triangle.
    pub smooth: bool,
    pub fog: bool,
    /// Interpolate vertex colors into the output.
    pub colorize: bool,
    /// Reserved for the shadow-map pass; keyed now so pipelines split
    /// correctly once shadows exist.
    pub shadowed: bool,
    pub style: SymbolStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            cull: CullMode::None,
            depth_test: true,
            lit: true,
            smooth: false,
            fog: false,
            colorize: false,
            shadowed: false,
            style: SymbolStyle::FullBlocks,
        }
    }
}

/// One compiled draw: a renderable instance as a pipeline consumes it.
#[derive(Clone)]
pub struct Subscriber {
    pub color: Rgba,
    pub transform: Mat4,
    pub geometry: Option<Arc<GeometryCache>>,
    pub texture: Option<Arc<TextureCache>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipelineId(usize);

/// Renderer-owned pipeline store, deduplicated by configuration.
#[derive(Default)]
pub struct PipelineCache {
    pipelines: Vec<Pipeline>,
    lookup: HashMap<PipelineConfig, PipelineId>,
    /// Last resolution passed to [`resize_and_clear`]; pipelines created
    /// mid-frame get their buffers sized to it immediately.
    ///
    /// [`resize_and_clear`]: PipelineCache::resize_and_clear
    resolution: UVec2,
}

impl PipelineCache {
    pub fn new() -> Self {
        PipelineCache::default()
    }

    pub fn get_or_create(&mut self, config: PipelineConfig) -> PipelineId {
        if let Some(&id) = self.lookup.get(&config) {
            return id;
        }
        let id = PipelineId(self.pipelines.len());
        let mut pipeline = Pipeline::new(config);
        pipeline.resize(self.resolution);
        self.pipelines.push(pipeline);
        self.lookup.insert(config, id);
        id
    }

    pub fn get(&self, id: PipelineId) -> &Pipeline {
        &self.pipelines[id.0]
    }

    pub fn get_mut(&mut self, id: PipelineId) -> &mut Pipeline {
        &mut self.pipelines[id.0]
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Frame setup: match every pipeline's buffers to the surface
    /// resolution and wipe them. The resolution sticks, so pipelines
    /// created later in the frame come out sized and clean.
    pub fn resize_and_clear(&mut self, resolution: UVec2) {
        self.resolution = resolution.max(UVec2::ONE);
        for pipeline in &mut self.pipelines {
            pipeline.resize(self.resolution);
            pipeline.clear();
        }
    }

    /// Wipe every pipeline's buffers without touching their size.
    pub fn clear_all(&mut self) {
        for pipeline in &mut self.pipelines {
            pipeline.clear();
        }
    }
}

/// Vertex in homogeneous clip space with the attributes that survive
/// clipping.
#[derive(Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    world: Vec3,
    normal: Vec3,
    uv: Vec2,
    color: Vec4,
}

impl ClipVertex {
    fn lerp(a: &ClipVertex, b: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            clip: a.clip.lerp(b.clip, t),
            world: a.world.lerp(b.world, t),
            normal: a.normal.lerp(b.normal, t),
            uv: a.uv.lerp(b.uv, t),
            color: a.color.lerp(b.color, t),
        }
    }
}

/// Clip a triangle against the near plane (`z + w > eps`), interpolating
/// every attribute at the crossings. Yields 0 to 4 points.
fn clip_near(tri: &[ClipVertex; 3]) -> ([ClipVertex; 4], usize) {
    let mut out = [tri[0]; 4];
    let mut n = 0;
    for i in 0..3 {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        let da = a.clip.z + a.clip.w;
        let db = b.clip.z + b.clip.w;
        let a_in = da > NEAR_EPS;
        let b_in = db > NEAR_EPS;
        if a_in {
            out[n] = a;
            n += 1;
        }
        if a_in != b_in {
            let t = da / (da - db);
            out[n] = ClipVertex::lerp(&a, &b, t);
            n += 1;
        }
    }
    (out, n)
}

/// One rasterization pipeline: a configuration plus the color and depth
/// buffers it rasterizes into. The color buffer's alpha channel marks
/// painted pixels; depth is normalized to [0,1] where 1 means empty.
pub struct Pipeline {
    config: PipelineConfig,
    pub fog: FogConfig,
    color: PixelBuffer<Rgba>,
    depth: PixelBuffer<f32>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            fog: FogConfig::default(),
            color: PixelBuffer::new(0, 0, Rgba::TRANSPARENT),
            depth: PixelBuffer::new(0, 0, 1.0),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Buffers are allocated at resolution × symbol density.
    pub fn resize(&mut self, resolution: UVec2) {
        let resolution = resolution.max(UVec2::ONE);
        let (dx, dy) = self.config.style.density();
        let w = resolution.x as usize * dx;
        let h = resolution.y as usize * dy;
        self.color.resize(w, h, Rgba::TRANSPARENT);
        self.depth.resize(w, h, 1.0);
    }

    pub fn clear(&mut self) {
        self.color.fill(Rgba::TRANSPARENT);
        self.depth.fill(1.0);
    }

    /// Rasterize one subscriber. `global_depth` is the owning layer's depth
    /// buffer, at surface resolution; it provides occlusion across
    /// pipelines and is the buffer the depth test runs against.
    pub fn render(
        &mut self,
        global_depth: &mut PixelBuffer<f32>,
        projected_view: &Mat4,
        subscriber: &Subscriber,
        lights: &[LightSample],
    ) {
        let Some(geometry) = subscriber.geometry.as_deref() else {
            return;
        };
        let mvp = *projected_view * subscriber.transform;
        let normal_matrix = Mat3::from_mat4(subscriber.transform);

        for tri in geometry.vertices().chunks_exact(3) {
            let mut clip = [ClipVertex {
                clip: Vec4::ZERO,
                world: Vec3::ZERO,
                normal: Vec3::Z,
                uv: Vec2::ZERO,
                color: Vec4::ONE,
            }; 3];
            for (out, v) in clip.iter_mut().zip(tri) {
                out.clip = mvp * v.position;
                out.world = (subscriber.transform * v.position).truncate();
                out.normal = (normal_matrix * v.normal).normalize_or_zero();
                out.uv = v.uv;
                out.color = v.color.to_vec4();
            }

            let (points, count) = clip_near(&clip);
            // Fan-triangulate whatever survived the near plane.
            for k in 1..count.saturating_sub(1) {
                self.fill_triangle(
                    global_depth,
                    subscriber,
                    lights,
                    &[points[0], points[k], points[k + 1]],
                );
            }
        }
    }

    fn fill_triangle(
        &mut self,
        global_depth: &mut PixelBuffer<f32>,
        subscriber: &Subscriber,
        lights: &[LightSample],
        tri: &[ClipVertex; 3],
    ) {
        let width = self.color.width();
        let height = self.color.height();
        if width == 0 || height == 0 {
            return;
        }

        let mut ndc = [Vec3::ZERO; 3];
        let mut inv_w = [0f32; 3];
        for i in 0..3 {
            let w = tri[i].clip.w;
            if w.abs() < W_EPS {
                debug!("triangle skipped: homogeneous weight near zero");
                return;
            }
            ndc[i] = tri[i].clip.truncate() / w;
            inv_w[i] = 1.0 / w;
        }

        // Winding cull from the NDC signed area. Counter-clockwise in NDC
        // (y up) is front-facing.
        let ndc_area = (ndc[1].x - ndc[0].x) * (ndc[2].y - ndc[0].y)
            - (ndc[1].y - ndc[0].y) * (ndc[2].x - ndc[0].x);
        match self.config.cull {
            CullMode::Back if ndc_area <= 0.0 => return,
            CullMode::Front if ndc_area >= 0.0 => return,
            _ => {}
        }

        let mut sx = [0f32; 3];
        let mut sy = [0f32; 3];
        let mut depth = [0f32; 3];
        for i in 0..3 {
            sx[i] = (ndc[i].x + 1.0) * 0.5 * width as f32;
            sy[i] = (1.0 - ndc[i].y) * 0.5 * height as f32;
            depth[i] = ndc[i].z * 0.5 + 0.5;
        }

        let area2 = (sy[1] - sy[2]) * (sx[0] - sx[2]) + (sx[2] - sx[1]) * (sy[0] - sy[2]);
        if area2.abs() < AREA_EPS {
            trace!("triangle skipped: zero screen area");
            return;
        }
        let inv_area = 1.0 / area2;

        let min_x = sx.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = sx.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min_y = sy.iter().copied().fold(f32::INFINITY, f32::min);
        let max_y = sy.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32 {
            return;
        }
        let x0 = min_x.max(0.0) as usize;
        let x1 = (max_x.min(width as f32 - 1.0)) as usize;
        let y0 = min_y.max(0.0) as usize;
        let y1 = (max_y.min(height as f32 - 1.0)) as usize;

        // Flat shading resolves one light value per triangle up front.
        let face_normal = (tri[0].normal + tri[1].normal + tri[2].normal).normalize_or_zero();
        let face_center = (tri[0].world + tri[1].world + tri[2].world) / 3.0;
        let flat_light = if self.config.lit && !self.config.smooth {
            shading::accumulate(lights, face_normal, face_center)
        } else {
            Vec3::ONE
        };

        let base_color = subscriber.color.to_vec4();
        let (dx, dy) = self.config.style.density();

        for y in y0..=y1 {
            let py = y as f32 + 0.5;
            let mut row_started = false;
            for x in x0..=x1 {
                let px = x as f32 + 0.5;
                let l0 = ((sy[1] - sy[2]) * (px - sx[2]) + (sx[2] - sx[1]) * (py - sy[2]))
                    * inv_area;
                let l1 = ((sy[2] - sy[0]) * (px - sx[2]) + (sx[0] - sx[2]) * (py - sy[2]))
                    * inv_area;
                let l2 = 1.0 - l0 - l1;
                if l0 < 0.0 || l1 < 0.0 || l2 < 0.0 {
                    // Interior pixels of a convex shape form one run per
                    // row; once it ends the row is done.
                    if row_started {
                        break;
                    }
                    continue;
                }
                row_started = true;

                let z = l0 * depth[0] + l1 * depth[1] + l2 * depth[2];
                if self.config.depth_test {
                    if z <= 0.0 || z >= 1.0 {
                        continue;
                    }
                    let gx = x / dx;
                    let gy = y / dy;
                    if z >= global_depth.get(gx, gy) {
                        continue;
                    }
                    // The global buffer stores one depth per glyph cell;
                    // the last pixel of the density group represents it.
                    if x % dx == dx - 1 && y % dy == dy - 1 {
                        global_depth.set(gx, gy, z);
                    }
                }
                self.depth.set(x, y, z);

                // Perspective-correct attribute weights.
                let pc0 = l0 * inv_w[0];
                let pc1 = l1 * inv_w[1];
                let pc2 = l2 * inv_w[2];
                let denom = pc0 + pc1 + pc2;
                if denom.abs() < f32::EPSILON {
                    continue;
                }
                let inv = 1.0 / denom;

                let mut color = base_color;
                if self.config.colorize {
                    let vcol =
                        (tri[0].color * pc0 + tri[1].color * pc1 + tri[2].color * pc2) * inv;
                    color *= vcol;
                }
                if let Some(texture) = subscriber.texture.as_deref() {
                    let uv = (tri[0].uv * pc0 + tri[1].uv * pc1 + tri[2].uv * pc2) * inv;
                    color *= texture.sample(uv).to_vec4();
                }
                if self.config.lit {
                    let light = if self.config.smooth {
                        let normal = ((tri[0].normal * pc0
                            + tri[1].normal * pc1
                            + tri[2].normal * pc2)
                            * inv)
                            .normalize_or_zero();
                        let surface = (tri[0].world * pc0
                            + tri[1].world * pc1
                            + tri[2].world * pc2)
                            * inv;
                        shading::accumulate(lights, normal, surface)
                    } else {
                        flat_light
                    };
                    color = (color.truncate() * light).extend(color.w);
                }
                if self.config.fog {
                    let f = self.fog.factor(z);
                    if f >= 1.0 {
                        color = self.fog.color.to_vec4();
                    } else if f > 0.0 {
                        let fog = self.fog.color.to_vec4();
                        color = color.lerp(fog, f);
                    }
                }

                let mut out = Rgba::from_vec4(color);
                out.a = 255;
                self.color.set(x, y, out);
            }
        }
    }

    /// Convert the pixel buffers into glyph cells on `image`. Unpainted
    /// pixels are left untouched so layers composite correctly.
    pub fn assemble(&self, image: &mut GlyphImage) -> Result<(), RenderError> {
        let (dx, dy) = self.config.style.density();
        if (dx, dy) != (1, 1) {
            return Err(RenderError::UnimplementedSymbolDensity { x: dx, y: dy });
        }

        let w = self.color.width().min(image.width());
        let h = self.color.height().min(image.height());
        for y in 0..h {
            for x in 0..w {
                let pixel = self.color.get(x, y);
                if pixel.a == 0 {
                    continue;
                }
                image.set(x, y, self.classify(x, y, pixel));
            }
        }
        Ok(())
    }

    /// Pick a glyph for one painted pixel from its 3×3 neighborhood. A
    /// consistent depth ridge or valley along a diagonal, column or row
    /// with similar colors turns into a line glyph; everything else is a
    /// solid block carrying the pixel color in both color slots.
    fn classify(&self, x: usize, y: usize, pixel: Rgba) -> GlyphCell {
        let w = self.color.width() as isize;
        let h = self.color.height() as isize;
        let probe = |ox: isize, oy: isize| -> Option<(Rgba, f32)> {
            let px = x as isize + ox;
            let py = y as isize + oy;
            if px < 0 || py < 0 || px >= w || py >= h {
                return None;
            }
            let c = self.color.get(px as usize, py as usize);
            if c.a == 0 {
                None
            } else {
                Some((c, self.depth.get(px as usize, py as usize)))
            }
        };
        // Off-grid and unpainted neighbors read as maximally distant.
        let depth_at = |ox: isize, oy: isize| probe(ox, oy).map_or(1.0, |(_, d)| d);

        // (glyph, cells along the line, perpendicular offsets)
        let candidates: [(char, [(isize, isize); 3], [(isize, isize); 2]); 4] = [
            ('╲', [(-1, -1), (0, 0), (1, 1)], [(1, -1), (-1, 1)]),
            ('╱', [(-1, 1), (0, 0), (1, -1)], [(-1, -1), (1, 1)]),
            ('│', [(0, -1), (0, 0), (0, 1)], [(-1, 0), (1, 0)]),
            ('─', [(-1, 0), (0, 0), (1, 0)], [(0, -1), (0, 1)]),
        ];

        for (glyph, line, sides) in candidates {
            let mut ridge = true;
            let mut valley = true;
            let mut colors_ok = true;
            for (lx, ly) in line {
                let Some((line_color, line_depth)) = probe(lx, ly) else {
                    ridge = false;
                    valley = false;
                    break;
                };
                if line_color.distance(pixel) > COLOR_EPS {
                    colors_ok = false;
                    break;
                }
                for (ox, oy) in sides {
                    let side = depth_at(lx + ox, ly + oy);
                    if side <= line_depth + RIDGE_EPS {
                        ridge = false;
                    }
                    if side >= line_depth - RIDGE_EPS {
                        valley = false;
                    }
                }
                if !ridge && !valley {
                    break;
                }
            }
            if (ridge || valley) && colors_ok {
                return GlyphCell::new(glyph, pixel, Rgba::BLACK);
            }
        }

        GlyphCell::solid(SOLID_BLOCK, pixel)
    }

    #[cfg(test)]
    pub(crate) fn paint(&mut self, x: usize, y: usize, color: Rgba, depth: f32) {
        self.color.set(x, y, color);
        self.depth.set(x, y, depth);
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> (Rgba, f32) {
        (self.color.get(x, y), self.depth.get(x, y))
    }

    pub fn painted_count(&self) -> usize {
        self.color.as_slice().iter().filter(|c| c.a != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MeshData, PositionChannel};

    fn clip_space_triangle(points: [Vec4; 3]) -> Arc<GeometryCache> {
        let mut mesh = MeshData::triangle_list();
        mesh.positions = Some(PositionChannel::Homogeneous(points.to_vec()));
        Arc::new(GeometryCache::build(&mesh).unwrap())
    }

    fn unlit_subscriber(geometry: Arc<GeometryCache>) -> Subscriber {
        Subscriber {
            color: Rgba::RED,
            transform: Mat4::IDENTITY,
            geometry: Some(geometry),
            texture: None,
        }
    }

    fn unlit_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new(PipelineConfig {
            lit: false,
            ..PipelineConfig::default()
        });
        pipeline.resize(UVec2::new(16, 16));
        pipeline
    }

    fn render_one(pipeline: &mut Pipeline, sub: &Subscriber) -> usize {
        let mut global = PixelBuffer::new(16, 16, 1.0);
        pipeline.render(&mut global, &Mat4::IDENTITY, sub, &[]);
        pipeline.painted_count()
    }

    #[test]
    fn visible_triangle_paints_pixels() {
        let geometry = clip_space_triangle([
            Vec4::new(-0.8, -0.8, 0.0, 1.0),
            Vec4::new(0.8, -0.8, 0.0, 1.0),
            Vec4::new(0.0, 0.8, 0.0, 1.0),
        ]);
        let mut pipeline = unlit_pipeline();
        let painted = render_one(&mut pipeline, &unlit_subscriber(geometry));
        assert!(painted > 20, "expected a large fill, painted {painted}");
    }

    #[test]
    fn triangle_behind_near_plane_paints_nothing() {
        // z + w <= 0 for every vertex: fully clipped away.
        let geometry = clip_space_triangle([
            Vec4::new(-0.5, -0.5, -2.0, 1.0),
            Vec4::new(0.5, -0.5, -2.0, 1.0),
            Vec4::new(0.0, 0.5, -2.0, 1.0),
        ]);
        let mut pipeline = unlit_pipeline();
        assert_eq!(render_one(&mut pipeline, &unlit_subscriber(geometry)), 0);
    }

    #[test]
    fn triangle_crossing_near_plane_is_partially_drawn() {
        let geometry = clip_space_triangle([
            Vec4::new(-0.5, -0.5, 0.0, 1.0),
            Vec4::new(0.5, -0.5, 0.0, 1.0),
            Vec4::new(0.0, 0.5, -3.0, 1.0),
        ]);
        let mut pipeline = unlit_pipeline();
        let painted = render_one(&mut pipeline, &unlit_subscriber(geometry));
        assert!(painted > 0, "clipped triangle should keep its front part");
    }

    #[test]
    fn collinear_triangle_is_skipped_without_panic() {
        let geometry = clip_space_triangle([
            Vec4::new(-0.5, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::new(0.5, 0.0, 0.0, 1.0),
        ]);
        let mut pipeline = unlit_pipeline();
        assert_eq!(render_one(&mut pipeline, &unlit_subscriber(geometry)), 0);
    }

    #[test]
    fn zero_w_vertex_is_skipped_without_panic() {
        let geometry = clip_space_triangle([
            Vec4::new(-0.5, -0.5, 0.5, 0.0),
            Vec4::new(0.5, -0.5, 0.5, 1.0),
            Vec4::new(0.0, 0.5, 0.5, 1.0),
        ]);
        let mut pipeline = unlit_pipeline();
        assert_eq!(render_one(&mut pipeline, &unlit_subscriber(geometry)), 0);
    }

    #[test]
    fn depth_test_keeps_the_nearer_triangle_regardless_of_order() {
        let near = clip_space_triangle([
            Vec4::new(-0.9, -0.9, -0.5, 1.0),
            Vec4::new(0.9, -0.9, -0.5, 1.0),
            Vec4::new(0.0, 0.9, -0.5, 1.0),
        ]);
        let far = clip_space_triangle([
            Vec4::new(-0.9, -0.9, 0.5, 1.0),
            Vec4::new(0.9, -0.9, 0.5, 1.0),
            Vec4::new(0.0, 0.9, 0.5, 1.0),
        ]);
        let near_sub = Subscriber { color: Rgba::GREEN, ..unlit_subscriber(near) };
        let far_sub = Subscriber { color: Rgba::BLUE, ..unlit_subscriber(far) };

        for order in [[&near_sub, &far_sub], [&far_sub, &near_sub]] {
            let mut pipeline = unlit_pipeline();
            let mut global = PixelBuffer::new(16, 16, 1.0);
            for sub in order {
                pipeline.render(&mut global, &Mat4::IDENTITY, sub, &[]);
            }
            let (color, _) = pipeline.pixel(8, 8);
            assert_eq!(color.r, 0);
            assert_eq!(color.g, 255, "nearer green triangle must win");
        }
    }

    #[test]
    fn backface_culling_rejects_clockwise_winding() {
        let ccw = clip_space_triangle([
            Vec4::new(-0.8, -0.8, 0.0, 1.0),
            Vec4::new(0.8, -0.8, 0.0, 1.0),
            Vec4::new(0.0, 0.8, 0.0, 1.0),
        ]);
        let cw = clip_space_triangle([
            Vec4::new(-0.8, -0.8, 0.0, 1.0),
            Vec4::new(0.0, 0.8, 0.0, 1.0),
            Vec4::new(0.8, -0.8, 0.0, 1.0),
        ]);
        let mut pipeline = Pipeline::new(PipelineConfig {
            lit: false,
            cull: CullMode::Back,
            ..PipelineConfig::default()
        });
        pipeline.resize(UVec2::new(16, 16));
        assert!(render_one(&mut pipeline, &unlit_subscriber(ccw)) > 0);

        let mut pipeline = Pipeline::new(PipelineConfig {
            lit: false,
            cull: CullMode::Back,
            ..PipelineConfig::default()
        });
        pipeline.resize(UVec2::new(16, 16));
        assert_eq!(render_one(&mut pipeline, &unlit_subscriber(cw)), 0);
    }

    #[test]
    fn assembly_of_flat_region_yields_solid_blocks() {
        let mut pipeline = unlit_pipeline();
        for y in 4..8 {
            for x in 4..8 {
                pipeline.paint(x, y, Rgba::RED, 0.5);
            }
        }
        let mut image = GlyphImage::new(16, 16);
        pipeline.assemble(&mut image).unwrap();
        let cell = image.get(5, 5);
        assert_eq!(cell.symbol, SOLID_BLOCK);
        assert_eq!(cell.fg, Rgba::RED);
        assert_eq!(cell.bg, Rgba::RED);
        assert!(image.get(0, 0).is_transparent());
    }

    #[test]
    fn thin_vertical_stroke_becomes_a_line_glyph() {
        let mut pipeline = unlit_pipeline();
        for y in 2..14 {
            pipeline.paint(8, y, Rgba::WHITE, 0.4);
        }
        let mut image = GlyphImage::new(16, 16);
        pipeline.assemble(&mut image).unwrap();
        assert_eq!(image.get(8, 8).symbol, '│');
    }

    #[test]
    fn diagonal_stroke_becomes_a_diagonal_glyph() {
        let mut pipeline = unlit_pipeline();
        for i in 2..14 {
            pipeline.paint(i, i, Rgba::WHITE, 0.4);
        }
        let mut image = GlyphImage::new(16, 16);
        pipeline.assemble(&mut image).unwrap();
        assert_eq!(image.get(8, 8).symbol, '╲');
    }

    #[test]
    fn dense_styles_refuse_assembly() {
        let mut pipeline = Pipeline::new(PipelineConfig {
            style: SymbolStyle::Braille,
            ..PipelineConfig::default()
        });
        pipeline.resize(UVec2::new(8, 8));
        let mut image = GlyphImage::new(8, 8);
        let err = pipeline.assemble(&mut image).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnimplementedSymbolDensity { x: 2, y: 4 }
        ));
    }

    #[test]
    fn braille_buffers_scale_by_density() {
        let mut pipeline = Pipeline::new(PipelineConfig {
            style: SymbolStyle::Braille,
            ..PipelineConfig::default()
        });
        pipeline.resize(UVec2::new(8, 8));
        assert_eq!(pipeline.color.width(), 16);
        assert_eq!(pipeline.color.height(), 32);
    }

    #[test]
    fn cache_sizes_pipelines_created_after_the_frame_setup() {
        let mut cache = PipelineCache::new();
        cache.resize_and_clear(UVec2::new(24, 12));
        let id = cache.get_or_create(PipelineConfig::default());
        let pipeline = cache.get(id);
        assert_eq!(pipeline.color.width(), 24);
        assert_eq!(pipeline.color.height(), 12);
    }

    #[test]
    fn cache_deduplicates_by_configuration() {
        let mut cache = PipelineCache::new();
        let a = cache.get_or_create(PipelineConfig::default());
        let b = cache.get_or_create(PipelineConfig::default());
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        let c = cache.get_or_create(PipelineConfig {
            fog: true,
            ..PipelineConfig::default()
        });
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
    }
}
