/// Demo entry point: a spinning lit cube rendered to the terminal.
/// Press any key to exit.
use std::io::{stdout, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::style::{Color, Colors, Print, ResetColor, SetColors};
use crossterm::{cursor, event, execute, queue, terminal};
use glam::{Mat4, Quat, UVec2, Vec3};

use glyph_engine::*;

/// Terminal-backed presentation surface.
struct TerminalSurface {
    resolution: UVec2,
}

impl Surface for TerminalSurface {
    fn resolution(&self) -> UVec2 {
        self.resolution
    }

    fn present(&mut self, image: &GlyphImage) {
        let mut out = stdout();
        let _ = queue!(out, cursor::MoveTo(0, 0));
        for y in 0..image.height() {
            let _ = queue!(out, cursor::MoveTo(0, y as u16));
            for x in 0..image.width() {
                let cell = image.get(x, y);
                let _ = queue!(
                    out,
                    SetColors(Colors::new(
                        Color::Rgb { r: cell.fg.r, g: cell.fg.g, b: cell.fg.b },
                        Color::Rgb { r: cell.bg.r, g: cell.bg.g, b: cell.bg.b },
                    )),
                    Print(cell.symbol),
                );
            }
        }
        let _ = queue!(out, ResetColor);
        let _ = out.flush();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let (cols, rows) = terminal::size()?;
    let resolution = UVec2::new(cols.max(1) as u32, rows.max(1) as u32);

    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

    let result = run(resolution);

    execute!(stdout(), cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(resolution: UVec2) -> Result<(), Box<dyn std::error::Error>> {
    let surface = TerminalSurface { resolution };
    let mut renderer = Renderer::new(Some(Box::new(surface)), RenderConfig::default())?;

    let cube = Arc::new(GeometryCache::build(&MeshData::cube(3.0))?);
    let layer_index = renderer.create_layer(LayerStyle::default());

    let layer = renderer.layer_mut(layer_index);
    layer.cameras.push(Camera::new());
    layer
        .lights
        .push(Light::directional(Rgba::opaque(255, 240, 210)));
    layer.lights[0]
        .instances
        .push(InstanceSnapshot::at(Mat4::from_quat(Quat::from_rotation_x(
            -0.9,
        ))));
    layer
        .renderables
        .push(Renderable::new(Rgba::opaque(90, 200, 255)).with_geometry(cube));

    let scene = SceneNode::with_renderables(vec![RenderableRef {
        layer: layer_index,
        index: 0,
    }]);

    let started = Instant::now();
    loop {
        if event::poll(Duration::from_millis(1))? {
            if let event::Event::Key(_) = event::read()? {
                break;
            }
        }

        let t = started.elapsed().as_secs_f32();
        let spin = Quat::from_rotation_y(t * 0.8) * Quat::from_rotation_x(t * 0.5);
        let transform =
            Mat4::from_rotation_translation(spin, Vec3::new(0.0, 0.0, -7.0));
        renderer
            .layer_mut(layer_index)
            .renderables[0]
            .refresh(vec![InstanceSnapshot::at(transform).with_bounding_radius(2.6)]);

        renderer.draw(&scene);
        std::thread::sleep(Duration::from_millis(33));
    }

    Ok(())
}
