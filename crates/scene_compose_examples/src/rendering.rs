use std::path::Path;

use glam::Vec2;
use image::{Rgb, RgbImage};
use scene_compose::prelude::*;

/// Logs at `info` unless `RUST_LOG` says otherwise. Safe to call more than once.
pub fn init_tracing() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Fill color per shape group.
pub fn group_color(group: ShapeGroup) -> [u8; 3] {
    match group {
        ShapeGroup::Sky => [250, 200, 40],
        ShapeGroup::Cloud => [200, 205, 215],
        ShapeGroup::Weather => [250, 240, 120],
        ShapeGroup::Fauna => [60, 60, 70],
        ShapeGroup::Building => [150, 95, 70],
        ShapeGroup::Nature => [60, 150, 70],
        ShapeGroup::Vehicle => [200, 50, 50],
    }
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub background: [u8; 3],
    pub grid_lines: Option<[u8; 3]>,
    pub forbidden: Option<[u8; 3]>,
    /// Pixels left blank around each footprint.
    pub inset: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: [130, 170, 215],
            grid_lines: Some([115, 150, 190]),
            forbidden: Some([180, 120, 160]),
            inset: 2,
        }
    }
}

impl RenderConfig {
    pub fn with_background(mut self, color: [u8; 3]) -> Self {
        self.background = color;
        self
    }

    pub fn without_grid(mut self) -> Self {
        self.grid_lines = None;
        self
    }
}

/// Draws `composition` at canvas resolution and writes it as PNG.
pub fn render_composition_to_png(
    composition: &Composition,
    tables: &SceneTables,
    spec: &GridSpec,
    canvas: Vec2,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = (canvas.x.max(1.0) as u32, canvas.y.max(1.0) as u32);
    let mut img = RgbImage::from_pixel(w, h, Rgb(config.background));
    let grid = &composition.grid;

    if !grid.is_degenerate() {
        if let Some(color) = config.forbidden {
            for row in 0..grid.rows {
                for col in 0..grid.cols {
                    if spec.forbidden.is_forbidden(row, col, grid.rows, grid.cols) {
                        fill_rect(&mut img, cell_rect(grid, row, col, 1, 1, 0), color);
                    }
                }
            }
        }
        if let Some(color) = config.grid_lines {
            draw_grid_lines(&mut img, grid, color);
        }
    }

    for item in &composition.placed {
        let fp = item.footprint;
        let color = tables
            .meta(item.shape)
            .map(|m| group_color(m.group))
            .unwrap_or([255, 0, 255]);
        fill_rect(
            &mut img,
            cell_rect(grid, fp.r0, fp.c0, fp.w, fp.h, config.inset),
            color,
        );
        if item.path != PlacementPath::Scored {
            let marker = cell_rect(grid, fp.r0, fp.c0, 1, 1, config.inset * 3);
            fill_rect(&mut img, marker, [20, 20, 20]);
        }
    }

    img.save(path.as_ref())?;
    Ok(())
}

#[derive(Clone, Copy)]
struct PixelRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

fn cell_rect(grid: &Grid, r0: usize, c0: usize, w: usize, h: usize, inset: u32) -> PixelRect {
    let x0 = grid.origin.x + c0 as f32 * grid.cell_size;
    let y0 = grid.origin.y + r0 as f32 * grid.cell_size;
    let x1 = x0 + w as f32 * grid.cell_size;
    let y1 = y0 + h as f32 * grid.cell_size;
    let inset = inset as f32;
    PixelRect {
        x0: (x0 + inset).max(0.0) as u32,
        y0: (y0 + inset).max(0.0) as u32,
        x1: (x1 - inset).max(0.0) as u32,
        y1: (y1 - inset).max(0.0) as u32,
    }
}

fn fill_rect(img: &mut RgbImage, rect: PixelRect, color: [u8; 3]) {
    let x1 = rect.x1.min(img.width());
    let y1 = rect.y1.min(img.height());
    for y in rect.y0..y1 {
        for x in rect.x0..x1 {
            img.put_pixel(x, y, Rgb(color));
        }
    }
}

fn draw_grid_lines(img: &mut RgbImage, grid: &Grid, color: [u8; 3]) {
    let (w, h) = (img.width(), img.height());
    for col in 0..=grid.cols {
        let x = (grid.origin.x + col as f32 * grid.cell_size) as u32;
        if x < w {
            for y in 0..h {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
    for row in 0..=grid.rows {
        let y = (grid.origin.y + row as f32 * grid.cell_size) as u32;
        if y < h {
            for x in 0..w {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}
