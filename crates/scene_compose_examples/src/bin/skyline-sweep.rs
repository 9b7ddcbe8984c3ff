use glam::Vec2;
use scene_compose::prelude::*;
use scene_compose::presets;
use scene_compose_examples::{init_tracing, render_composition_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let canvas = Vec2::new(1280.0, 720.0);
    let composer = presets::skyline_composer()?;
    let density = presets::skyline_density();
    let steps = 40;

    // The pool is carried from frame to frame; only its size follows the density curve.
    let mut pool: Vec<PoolItem> = Vec::new();
    println!("    u  size  clear cloudy rainy stormy  moved placed dropped");
    for step in 0..=steps {
        let u = step as f32 / steps as f32;
        resize_pool(&mut pool, density.desired_size(u), ConditionKind::Clear);

        let out = composer.compose(canvas, u, &pool)?;
        println!(
            "{:5.3} {:5} {:6} {:6} {:5} {:6} {:6} {:6} {:7}",
            u,
            pool.len(),
            out.counts[0],
            out.counts[1],
            out.counts[2],
            out.counts[3],
            out.reassigned,
            out.placed.len(),
            out.dropped
        );

        if step % 10 == 0 {
            render_composition_to_png(
                &out,
                composer.tables(),
                &composer.config().grid,
                canvas,
                &RenderConfig::default(),
                format!("skyline-sweep-{:02}.png", step),
            )?;
        }
        pool = out.next_pool;
    }

    Ok(())
}
