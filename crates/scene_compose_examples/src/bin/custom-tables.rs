use glam::Vec2;
use scene_compose::prelude::*;
use scene_compose::catalog::ShapeId::*;
use scene_compose_examples::{init_tracing, render_composition_to_png, RenderConfig};

/// Turns houses standing in the outermost columns into trees.
struct GreenEdges;

impl PostFix for GreenEdges {
    fn name(&self) -> &str {
        "green_edges"
    }

    fn apply(&self, ctx: &PostFixContext<'_>, placed: &mut [PlacedItem]) -> Option<PostFixChange> {
        let last = ctx.grid.cols.checked_sub(1)?;
        let item = placed.iter_mut().find(|p| {
            p.shape == ShapeId::House && (p.footprint.c0 == 0 || p.footprint.c0 == last)
        })?;
        item.shape = ShapeId::Tree;
        item.path = PlacementPath::PostFix;
        Some(PostFixChange {
            id: item.id,
            from: ShapeId::House,
            to: ShapeId::Tree,
        })
    }
}

fn village_tables() -> SceneTables {
    let street = KindCatalog::new(vec![
        Variant::new(House, 1, 1),
        Variant::new(Tree, 1, 1),
        Variant::new(Car, 2, 1),
    ])
    .with_anchor(QuotaAnchor::new(0.0).capped(Car, 1).unbounded(House).unbounded(Tree))
    .with_anchor(QuotaAnchor::new(1.0).capped(Car, 4).unbounded(House));

    let sky = KindCatalog::new(vec![Variant::new(Cloud, 2, 1), Variant::new(Bird, 1, 1)])
        .with_anchor(QuotaAnchor::new(0.0).capped(Bird, 2).unbounded(Cloud));

    let storm = KindCatalog::new(vec![
        Variant::new(StormCloud, 3, 1),
        Variant::new(Lightning, 1, 2),
    ])
    .with_anchor(QuotaAnchor::new(0.0).capped(Lightning, 1).unbounded(StormCloud));

    SceneTables::new()
        .with_kind(ConditionKind::Clear, street.clone())
        .with_kind(ConditionKind::Cloudy, sky)
        .with_kind(ConditionKind::Rainy, street)
        .with_kind(ConditionKind::Stormy, storm)
        .with_mix(MixAnchor::new(0.0, [6.0, 3.0, 0.0, 0.0]))
        .with_mix(MixAnchor::new(1.0, [2.0, 3.0, 3.0, 2.0]))
        .with_shape(House, Band::new(0.6, 1.0), ShapeMeta::new(ShapeGroup::Building, 1.0))
        .with_shape(
            Tree,
            Band::new(0.6, 1.0),
            ShapeMeta::new(ShapeGroup::Nature, 1.0).decorative(),
        )
        .with_shape(Car, Band::new(0.9, 1.0), ShapeMeta::new(ShapeGroup::Vehicle, 2.0))
        .with_shape(Cloud, Band::new(0.0, 0.3), ShapeMeta::new(ShapeGroup::Cloud, 2.0))
        .with_shape(
            Bird,
            Band::new(0.1, 0.5),
            ShapeMeta::new(ShapeGroup::Fauna, 1.0).decorative(),
        )
        .with_shape(
            StormCloud,
            Band::new(0.0, 0.25),
            ShapeMeta::new(ShapeGroup::Cloud, 3.0),
        )
        .with_shape(
            Lightning,
            Band::new(0.2, 0.6),
            ShapeMeta::new(ShapeGroup::Weather, 3.0),
        )
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A river runs down the middle third of the lower half.
    let river = |row: usize, col: usize, rows: usize, cols: usize| {
        row >= rows / 2 && col * 3 >= cols && col * 3 < cols * 2
    };
    let config = ComposeConfig::new(GridSpec::new(8, 1.0).with_forbidden(river))
        .with_scoring(ScoringConfig::default().with_jitter(0.6))
        .with_salt(7);
    let composer = SceneComposer::try_new(village_tables(), config)?.with_post_fix(GreenEdges);

    let canvas = Vec2::new(960.0, 480.0);
    let mut pool = Vec::new();
    resize_pool(&mut pool, 16, ConditionKind::Clear);

    for (frame, u) in [0.0f32, 0.5, 1.0].into_iter().enumerate() {
        let mut sink = FnSink::new(|event| match event {
            ComposeEvent::KindsRetargeted { ids } => println!("  retargeted {ids:?}"),
            ComposeEvent::ItemDropped { id, shape } => println!("  dropped #{id} ({shape})"),
            ComposeEvent::PostFixApplied { fix, id, from, to } => {
                println!("  {fix}: #{id} {from} -> {to}")
            }
            ComposeEvent::Finished { placed, dropped } => {
                println!("  placed {placed}, dropped {dropped}")
            }
            _ => {}
        });
        println!("u = {u}");
        let out = composer.compose_with_events(canvas, u, &pool, &mut sink)?;
        render_composition_to_png(
            &out,
            composer.tables(),
            &composer.config().grid,
            canvas,
            &RenderConfig::default().with_background([170, 200, 230]),
            format!("custom-tables-{frame}.png"),
        )?;
        pool = out.next_pool;
    }

    Ok(())
}
