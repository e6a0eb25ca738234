/// Layer compilation and rendering tests: draw-order disciplines, level
/// isolation and the fallback camera.
use std::cmp::Reverse;
use std::sync::Arc;

use glam::{Mat4, UVec2, Vec3};
use glyph_engine::layer::FALLBACK_CAMERA;
use glyph_engine::rendering::SOLID_BLOCK;
use glyph_engine::*;

fn quad(size: f32) -> Arc<GeometryCache> {
    Arc::new(GeometryCache::build(&MeshData::quad(size, size)).unwrap())
}

fn scene_for_layer(layer: usize, indices: &[usize]) -> SceneNode {
    SceneNode::with_renderables(
        indices
            .iter()
            .map(|&index| RenderableRef { layer, index })
            .collect(),
    )
}

#[test]
fn hierarchical_sequence_preserves_scene_traversal_order() {
    let mut layer = Layer::new(0, LayerStyle::HIERARCHICAL);
    let colors = [Rgba::RED, Rgba::GREEN, Rgba::BLUE];
    for color in colors {
        layer
            .renderables
            .push(Renderable::new(color).with_geometry(quad(10.0)));
    }

    // Authored order differs from storage order.
    let scene = scene_for_layer(0, &[2, 0, 1]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(32, 32));
    layer.generate(&scene, UVec2::new(32, 32), &mut pipelines);

    let draws = &layer.hierarchy()[&FALLBACK_CAMERA][&Reverse(Level::DEFAULT)];
    let drawn: Vec<Rgba> = draws.iter().map(|(_, sub)| sub.color).collect();
    assert_eq!(
        drawn,
        vec![Rgba::BLUE, Rgba::RED, Rgba::GREEN],
        "hierarchical draws must follow the scene tree, not storage order"
    );
}

#[test]
fn hierarchical_overlap_is_won_by_the_later_draw() {
    let mut layer = Layer::new(0, LayerStyle::HIERARCHICAL);
    let position = Mat4::from_translation(Vec3::new(16.0, 16.0, 0.0));
    for color in [Rgba::RED, Rgba::GREEN, Rgba::BLUE] {
        layer.renderables.push(
            Renderable::new(color)
                .with_geometry(quad(10.0))
                .with_instances(vec![InstanceSnapshot::at(position)]),
        );
    }

    let scene = scene_for_layer(0, &[2, 0, 1]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(32, 32));
    layer.generate(&scene, UVec2::new(32, 32), &mut pipelines);
    layer.render(&mut pipelines);

    // Renderable 1 is drawn last in the authored order, so it covers the
    // others even without depth testing.
    let center = layer.image().get(16, 16);
    assert_eq!(center.symbol, SOLID_BLOCK);
    assert_eq!(center.fg, Rgba::GREEN);
}

#[test]
fn levels_do_not_occlude_each_other() {
    let mut layer = Layer::new(0, LayerStyle::MULTILEVEL);
    let mut camera = Camera::new();
    camera.observable_range = LevelRange::new(Level(0), Level(1));
    layer.cameras.push(camera);

    // The octave-1 quad sits nearer to the camera than the octave-0 one;
    // if depth leaked across levels it would occlude the later draw.
    layer.renderables.push(
        Renderable::new(Rgba::RED).with_geometry(quad(8.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))
                .with_level(Level(1)),
        ]),
    );
    layer.renderables.push(
        Renderable::new(Rgba::BLUE).with_geometry(quad(30.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -12.0)))
                .with_level(Level(0)),
        ]),
    );

    let scene = scene_for_layer(0, &[0, 1]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(32, 32));
    layer.generate(&scene, UVec2::new(32, 32), &mut pipelines);
    layer.render(&mut pipelines);

    let center = layer.image().get(16, 16);
    assert_eq!(
        center.fg,
        Rgba::BLUE,
        "the level drawn later must paint over the earlier one, nearer or not"
    );
}

#[test]
fn pixel_residue_does_not_cross_level_boundaries() {
    let mut layer = Layer::new(0, LayerStyle::MULTILEVEL);
    let mut camera = Camera::new();
    camera.observable_range = LevelRange::new(Level(0), Level(1));
    layer.cameras.push(camera);

    // Octave 1 fills the whole view; octave 0 adds a small patch.
    layer.renderables.push(
        Renderable::new(Rgba::RED).with_geometry(quad(30.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -12.0)))
                .with_level(Level(1)),
        ]),
    );
    layer.renderables.push(
        Renderable::new(Rgba::BLUE).with_geometry(quad(1.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))
                .with_level(Level(0)),
        ]),
    );

    let scene = scene_for_layer(0, &[0, 1]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(32, 32));
    layer.generate(&scene, UVec2::new(32, 32), &mut pipelines);
    layer.render(&mut pipelines);

    // The image keeps what each octave assembled...
    assert!(layer.image().count_fg(Rgba::RED) > 500);
    // ...but the shared pixel buffers hold only the last octave's pixels,
    // so no later assembly can re-stamp stale content.
    let id = pipelines.get_or_create(PipelineConfig::default());
    let residue = pipelines.get(id).painted_count();
    assert!(residue > 0, "the octave-0 patch itself must be present");
    assert!(
        residue < 200,
        "stale pixels from the earlier octave remain: {residue}"
    );
}

#[test]
fn sorted_batches_are_ordered_back_to_front() {
    let mut layer = Layer::new(0, LayerStyle::MULTILEVEL | LayerStyle::SORTED);
    layer.cameras.push(Camera::new());
    layer.renderables.push(
        Renderable::new(Rgba::WHITE).with_geometry(quad(2.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))),
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0))),
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0))),
        ]),
    );

    let scene = scene_for_layer(0, &[0]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(32, 32));
    layer.generate(&scene, UVec2::new(32, 32), &mut pipelines);

    let levels = &layer.batch()[&0][&Reverse(Level::DEFAULT)];
    let subscribers = levels.values().next().expect("one pipeline bucket");
    let depths: Vec<f32> = subscribers
        .iter()
        .map(|s| -s.transform.w_axis.z)
        .collect();
    assert_eq!(depths, vec![20.0, 10.0, 5.0], "farthest first");
}

#[test]
fn fallback_camera_draws_in_pixel_space() {
    let mut layer = Layer::new(0, LayerStyle::default());
    layer.renderables.push(
        Renderable::new(Rgba::GREEN).with_geometry(quad(6.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(10.0, 10.0, 0.0))),
        ]),
    );

    let scene = scene_for_layer(0, &[0]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(40, 20));
    layer.generate(&scene, UVec2::new(40, 20), &mut pipelines);
    layer.render(&mut pipelines);

    let cell = layer.image().get(10, 10);
    assert!(!cell.is_transparent(), "quad should cover its pixel anchor");
    assert_eq!(cell.fg, Rgba::GREEN);
    assert!(
        layer.image().get(30, 10).is_transparent(),
        "pixels far outside the quad stay untouched"
    );
}

#[test]
fn instance_level_mismatch_compiles_nothing() {
    let mut layer = Layer::new(0, LayerStyle::default());
    let mut camera = Camera::new();
    camera.observable_range = LevelRange::new(Level(0), Level(0));
    layer.cameras.push(camera);
    layer.renderables.push(
        Renderable::new(Rgba::RED).with_geometry(quad(4.0)).with_instances(vec![
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))
                .with_level(Level(3)),
        ]),
    );

    let scene = scene_for_layer(0, &[0]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(16, 16));
    layer.generate(&scene, UVec2::new(16, 16), &mut pipelines);
    assert!(layer.batch().is_empty());
}

#[test]
fn out_of_frustum_instances_are_culled() {
    let mut layer = Layer::new(0, LayerStyle::default());
    layer.cameras.push(Camera::new());
    layer.renderables.push(
        Renderable::new(Rgba::RED).with_geometry(quad(4.0)).with_instances(vec![
            // Behind the camera, with a bounding radius so culling applies.
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, 50.0)))
                .with_bounding_radius(3.0),
            // In front, kept.
            InstanceSnapshot::at(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))
                .with_bounding_radius(3.0),
        ]),
    );

    let scene = scene_for_layer(0, &[0]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(16, 16));
    layer.generate(&scene, UVec2::new(16, 16), &mut pipelines);

    let levels = &layer.batch()[&0][&Reverse(Level::DEFAULT)];
    let subscribers = levels.values().next().expect("one pipeline bucket");
    assert_eq!(subscribers.len(), 1, "only the visible instance survives");
    assert!(subscribers[0].transform.w_axis.z < 0.0);
}

#[test]
fn renderables_share_pipelines_through_the_cache() {
    let mut layer = Layer::new(0, LayerStyle::default());
    for color in [Rgba::RED, Rgba::GREEN, Rgba::BLUE] {
        layer.renderables.push(
            Renderable::new(color).with_geometry(quad(4.0)).with_instances(vec![
                InstanceSnapshot::at(Mat4::from_translation(Vec3::new(8.0, 8.0, 0.0))),
            ]),
        );
    }

    let scene = scene_for_layer(0, &[0, 1, 2]);
    let mut pipelines = PipelineCache::new();
    layer.prepare(UVec2::new(16, 16));
    layer.generate(&scene, UVec2::new(16, 16), &mut pipelines);
    assert_eq!(
        pipelines.len(),
        1,
        "identical configurations must deduplicate to one pipeline"
    );
}
