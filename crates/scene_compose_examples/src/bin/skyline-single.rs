use glam::Vec2;
use scene_compose::prelude::*;
use scene_compose::presets;
use scene_compose::quota::clamp_unit;
use scene_compose_examples::{init_tracing, render_composition_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Usage: skyline-single [u] [width] [height]
    let mut args = std::env::args().skip(1);
    let u: f32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0.5);
    let width: f32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1280.0);
    let height: f32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(720.0);
    let canvas = Vec2::new(width, height);

    let composer = presets::skyline_composer()?;
    let mut pool = Vec::new();
    resize_pool(
        &mut pool,
        presets::skyline_density().desired_size(u),
        ConditionKind::Clear,
    );

    let out = composer.compose(canvas, u, &pool)?;
    println!(
        "grid {}x{} (cell {:.1}px, {} used rows)",
        out.grid.cols, out.grid.rows, out.grid.cell_size, out.grid.used_rows
    );
    for item in &out.placed {
        println!(
            "#{:<3} {:<6} {:<12} row {:>2} col {:>2} at ({:7.1}, {:6.1}) {:?}",
            item.id,
            item.kind,
            item.shape,
            item.footprint.r0,
            item.footprint.c0,
            item.position.x,
            item.position.y,
            item.path
        );
    }

    let path = format!("skyline-single-u{:.2}.png", clamp_unit(u));
    render_composition_to_png(
        &out,
        composer.tables(),
        &composer.config().grid,
        canvas,
        &RenderConfig::default(),
        &path,
    )?;
    println!("wrote {path}");
    Ok(())
}
