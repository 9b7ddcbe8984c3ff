use scene_compose::prelude::*;
use scene_compose::presets;
use scene_compose::quota::{mix_weights, resolve_quota};
use scene_compose_examples::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let tables = presets::skyline_tables();
    let total = 20;

    println!("kind counts for {total} members, with and without the dominance rule");
    println!("    u  weights                       plain          dominant");
    for step in 0..=10 {
        let u = step as f32 / 10.0;
        let w = mix_weights(&tables.mix, u)?;
        let plain = allocate(&tables.mix, u, total, DominancePolicy::Off)?;
        let dominant = allocate(&tables.mix, u, total, DominancePolicy::EnsureDominant)?;
        println!(
            "{u:5.2}  [{:5.2} {:5.2} {:5.2} {:5.2}]  {plain:?}  {dominant:?}",
            w[0], w[1], w[2], w[3]
        );
    }

    println!();
    println!("shape quota per kind");
    for kind in ConditionKind::ALL {
        let catalog = tables.catalog(kind);
        for u in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let quota = resolve_quota(&catalog.quota, &catalog.variants, u);
            let limits: Vec<String> = quota
                .entries
                .iter()
                .map(|(v, limit)| match limit {
                    QuotaLimit::Capped(n) => format!("{}={}", v.shape, n),
                    QuotaLimit::Unbounded => format!("{}=*", v.shape),
                })
                .collect();
            println!("{kind:<7} u={u:4.2}  {}", limits.join(" "));
        }
    }

    Ok(())
}
